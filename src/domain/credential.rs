//! Signing credential: private key material plus the matching certificate.

use std::fmt;

use zeroize::Zeroizing;

/// Already-loaded key material. Reading and decrypting key files happens
/// before this value is built.
///
/// The private key is zeroized on drop and redacted from `Debug`.
#[derive(Clone)]
pub struct Credential {
    private_key: Zeroizing<Vec<u8>>,
    certificate: Vec<u8>,
}

impl Credential {
    pub fn new(private_key: impl Into<Vec<u8>>, certificate: impl Into<Vec<u8>>) -> Self {
        Self {
            private_key: Zeroizing::new(private_key.into()),
            certificate: certificate.into(),
        }
    }

    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("private_key", &"[REDACTED]")
            .field("certificate_len", &self.certificate.len())
            .finish()
    }
}
