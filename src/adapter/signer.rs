//! Ed25519 request signer.
//!
//! The signed blob is base64 of a JSON envelope carrying the document, the
//! detached signature and the signer's certificate:
//!
//! ```json
//! {"version":1,"algorithm":"Ed25519","content":"..","signature":"..","certificate":".."}
//! ```
//!
//! Binary fields are standard base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer as _, SigningKey, SECRET_KEY_LENGTH};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::domain::Credential;
use crate::error::AuthError;
use crate::port::RequestSigner;

pub const ALGORITHM: &str = "Ed25519";
const ENVELOPE_VERSION: u8 = 1;

#[derive(Serialize)]
struct SignedEnvelope<'a> {
    version: u8,
    algorithm: &'a str,
    content: String,
    signature: String,
    certificate: String,
}

/// Signs login documents with an Ed25519 seed taken from the credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signer;

impl Ed25519Signer {
    pub fn new() -> Self {
        Self
    }

    fn signing_key(credential: &Credential) -> Result<SigningKey, AuthError> {
        let key = credential.private_key();
        if key.len() != SECRET_KEY_LENGTH {
            return Err(AuthError::Credential(format!(
                "private key must be {SECRET_KEY_LENGTH} bytes, got {}",
                key.len()
            )));
        }
        let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        seed.copy_from_slice(key);
        Ok(SigningKey::from_bytes(&seed))
    }
}

impl RequestSigner for Ed25519Signer {
    fn sign(&self, document: &[u8], credential: &Credential) -> Result<String, AuthError> {
        if credential.certificate().is_empty() {
            return Err(AuthError::Credential("certificate is empty".into()));
        }
        if document.is_empty() {
            return Err(AuthError::Signing("refusing to sign an empty document".into()));
        }

        let key = Self::signing_key(credential)?;
        let signature = key
            .try_sign(document)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        let envelope = SignedEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: ALGORITHM,
            content: BASE64.encode(document),
            signature: BASE64.encode(signature.to_bytes()),
            certificate: BASE64.encode(credential.certificate()),
        };
        let json = serde_json::to_vec(&envelope).map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(BASE64.encode(json))
    }

    fn algorithm(&self) -> &'static str {
        ALGORITHM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    fn credential(seed: [u8; 32]) -> Credential {
        Credential::new(seed.to_vec(), b"-----BEGIN CERTIFICATE-----".to_vec())
    }

    fn decode(blob: &str) -> serde_json::Value {
        let json = BASE64.decode(blob).unwrap();
        serde_json::from_slice(&json).unwrap()
    }

    #[test]
    fn signature_verifies_against_public_key() {
        let seed = [7u8; 32];
        let blob = Ed25519Signer::new()
            .sign(b"<loginTicketRequest/>", &credential(seed))
            .unwrap();
        let envelope = decode(&blob);

        assert_eq!(envelope["algorithm"], ALGORITHM);
        let content = BASE64.decode(envelope["content"].as_str().unwrap()).unwrap();
        assert_eq!(content, b"<loginTicketRequest/>");

        let sig_bytes: [u8; 64] = BASE64
            .decode(envelope["signature"].as_str().unwrap())
            .unwrap()
            .try_into()
            .unwrap();
        let public = SigningKey::from_bytes(&seed).verifying_key();
        assert!(public
            .verify(&content, &Signature::from_bytes(&sig_bytes))
            .is_ok());
    }

    #[test]
    fn signing_is_deterministic() {
        let signer = Ed25519Signer::new();
        let a = signer.sign(b"doc", &credential([1; 32])).unwrap();
        let b = signer.sign(b"doc", &credential([1; 32])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn short_key_is_credential_error() {
        let cred = Credential::new(vec![1u8; 16], b"cert".to_vec());
        let err = Ed25519Signer::new().sign(b"doc", &cred).unwrap_err();
        assert!(matches!(err, AuthError::Credential(_)));
    }

    #[test]
    fn missing_certificate_is_credential_error() {
        let cred = Credential::new(vec![1u8; 32], Vec::new());
        let err = Ed25519Signer::new().sign(b"doc", &cred).unwrap_err();
        assert!(matches!(err, AuthError::Credential(_)));
    }

    #[test]
    fn empty_document_is_signing_error() {
        let err = Ed25519Signer::new()
            .sign(b"", &credential([2; 32]))
            .unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
    }
}
