//! reqwest-backed SOAP transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, trace};

use crate::error::{PoolError, TransportError};
use crate::port::{SoapRequest, SoapResponse, Transport, TransportFactory};

const CONTENT_TYPE: &str = "text/xml; charset=utf-8";
const USER_AGENT: &str = concat!("afip-client/", env!("CARGO_PKG_VERSION"));

/// One HTTP channel. Each pooled connection owns its own client so a broken
/// keep-alive socket is dropped together with the connection.
pub struct HttpTransport {
    http: HttpClient,
    connection_id: u64,
}

impl HttpTransport {
    /// Build a transport with its own single-socket client.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Connect`] if the TLS backend cannot be initialized.
    pub fn new(connection_id: u64, connect_timeout: Duration) -> Result<Self, PoolError> {
        let http = HttpClient::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(1)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PoolError::Connect(e.to_string()))?;
        Ok(Self {
            http,
            connection_id,
        })
    }

    /// Factory suitable for [`ConnectionPool`](crate::infrastructure::pool::ConnectionPool).
    pub fn factory(connect_timeout: Duration) -> TransportFactory {
        Arc::new(move |id: u64| -> Result<Box<dyn Transport>, PoolError> {
            let transport = HttpTransport::new(id, connect_timeout)?;
            Ok(Box::new(transport) as Box<dyn Transport>)
        })
    }

    fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        trace!(
            connection_id = self.connection_id,
            endpoint = %request.endpoint,
            action = %request.action,
            "Sending SOAP request"
        );

        let timeout = request.timeout;
        let response = self
            .http
            .post(request.endpoint)
            .timeout(timeout)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("SOAPAction", format!("\"{}\"", request.action))
            .body(request.body)
            .send()
            .await
            .map_err(|e| Self::classify(&e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(&e, timeout))?;

        debug!(
            connection_id = self.connection_id,
            status,
            bytes = body.len(),
            "SOAP response received"
        );
        Ok(SoapResponse { status, body })
    }
}
