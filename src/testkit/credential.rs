//! Throwaway credentials for signing tests.

use rand::RngCore;

use crate::domain::Credential;

/// A fresh Ed25519 seed paired with a dummy certificate.
pub fn generate() -> Credential {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    Credential::new(seed.to_vec(), b"test-certificate".to_vec())
}
