use crate::domain::Credential;
use crate::error::AuthError;

/// Produces the signed login blob sent to the login service.
///
/// Pure transform: no I/O. Implementations must not log or retain key material.
pub trait RequestSigner: Send + Sync {
    /// Sign `document` with `credential`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Credential`] when the key or certificate is unusable
    /// - [`AuthError::Signing`] for any cryptographic or encoding failure
    fn sign(&self, document: &[u8], credential: &Credential) -> Result<String, AuthError>;

    /// Algorithm name, for logs.
    fn algorithm(&self) -> &'static str;
}
