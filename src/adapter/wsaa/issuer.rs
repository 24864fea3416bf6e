use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use super::request::{login_envelope, LoginTicketRequest};
use super::response::parse_login_response;
use crate::domain::{AuthTicket, Credential, ServiceName};
use crate::error::{AuthError, TransportError};
use crate::port::{RequestSigner, SoapRequest, Transport, TicketIssuer};

/// Issues tickets by signing a login request and calling `loginCms`.
pub struct WsaaTicketIssuer {
    endpoint: Url,
    credential: Credential,
    signer: Arc<dyn RequestSigner>,
    transport: Arc<dyn Transport>,
    request_window: Duration,
    timeout: Duration,
}

impl WsaaTicketIssuer {
    pub fn new(
        endpoint: Url,
        credential: Credential,
        signer: Arc<dyn RequestSigner>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            endpoint,
            credential,
            signer,
            transport,
            request_window: Duration::from_secs(600),
            timeout: Duration::from_secs(30),
        }
    }

    /// Validity window of the signed request around the current time.
    #[must_use]
    pub fn with_request_window(mut self, window: Duration) -> Self {
        self.request_window = window;
        self
    }

    /// HTTP timeout for the login call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issue a ticket for `service` with an explicit credential.
    pub async fn issue_with(
        &self,
        service: ServiceName,
        credential: &Credential,
    ) -> Result<AuthTicket, AuthError> {
        let started = Instant::now();
        let request = LoginTicketRequest::new(service, Utc::now(), self.request_window)?;
        let signed = self.signer.sign(request.to_xml().as_bytes(), credential)?;

        debug!(
            service = %service,
            unique_id = request.unique_id,
            algorithm = self.signer.algorithm(),
            "Requesting access ticket"
        );

        let response = self
            .transport
            .send(SoapRequest {
                endpoint: self.endpoint.clone(),
                action: String::new(),
                body: login_envelope(&signed),
                timeout: self.timeout,
            })
            .await
            .map_err(|e| remote_error(service, &e))?;

        match parse_login_response(service, &response, Utc::now()) {
            Ok(ticket) => {
                info!(
                    service = %service,
                    expires_at = %ticket.expires_at(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Access ticket issued"
                );
                Ok(ticket)
            }
            Err(err) => {
                warn!(service = %service, error = %err, "Login failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl TicketIssuer for WsaaTicketIssuer {
    async fn issue(&self, service: ServiceName) -> Result<AuthTicket, AuthError> {
        self.issue_with(service, &self.credential).await
    }
}

fn remote_error(service: ServiceName, err: &TransportError) -> AuthError {
    AuthError::RemoteAuth {
        service,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::signer::Ed25519Signer;
    use crate::adapter::soap;
    use crate::testkit::{self, fixtures, transport::ScriptedTransport};
    use chrono::Duration as ChronoDuration;

    fn issuer(transport: Arc<ScriptedTransport>) -> WsaaTicketIssuer {
        WsaaTicketIssuer::new(
            Url::parse("http://127.0.0.1:1/LoginCms").unwrap(),
            testkit::credential::generate(),
            Arc::new(Ed25519Signer::new()),
            transport,
        )
    }

    #[tokio::test]
    async fn signed_request_reaches_transport() {
        let now = Utc::now();
        let transport = Arc::new(ScriptedTransport::always_ok(fixtures::login_response(
            "T",
            "S",
            now,
            now + ChronoDuration::hours(12),
        )));
        let ticket = issuer(transport.clone()).issue(ServiceName::Wsfe).await.unwrap();
        assert_eq!(ticket.token(), "T");

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        let blob = soap::extract_tag(&sent[0].body, "in0").unwrap();
        assert!(!blob.is_empty());
        assert_eq!(sent[0].endpoint.path(), "/LoginCms");
    }

    #[tokio::test]
    async fn transport_failure_is_remote_auth_error() {
        let transport = Arc::new(ScriptedTransport::always_err(TransportError::Connect(
            "refused".into(),
        )));
        let err = issuer(transport).issue(ServiceName::Wsfex).await.unwrap_err();
        assert!(matches!(err, AuthError::RemoteAuth { service: ServiceName::Wsfex, .. }));
    }

    #[tokio::test]
    async fn bad_credential_never_reaches_transport() {
        let transport = Arc::new(ScriptedTransport::always_ok(String::new()));
        let issuer = issuer(transport.clone());
        let bad = Credential::new(vec![0u8; 3], b"cert".to_vec());
        let err = issuer.issue_with(ServiceName::Wsfe, &bad).await.unwrap_err();
        assert!(matches!(err, AuthError::Credential(_)));
        assert!(transport.requests().is_empty());
    }
}
