use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{PoolError, TransportError};

/// A single SOAP 1.1 call.
#[derive(Debug, Clone)]
pub struct SoapRequest {
    pub endpoint: Url,
    /// Value of the `SOAPAction` header (may be empty).
    pub action: String,
    /// Full envelope.
    pub body: String,
    pub timeout: Duration,
}

/// Raw HTTP outcome. Non-2xx statuses are data, not transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    pub status: u16,
    pub body: String,
}

impl SoapResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One reusable channel to the remote platform.
///
/// Returning `Err` means the channel itself is suspect; pooled channels that
/// fail are discarded instead of being reused.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError>;
}

/// Opens new transport channels on demand. Called with the connection id.
pub type TransportFactory =
    Arc<dyn Fn(u64) -> Result<Box<dyn Transport>, PoolError> + Send + Sync>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        (**self).send(request).await
    }
}
