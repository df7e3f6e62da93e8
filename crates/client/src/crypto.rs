//! Signing and encryption capabilities.
//!
//! Key management and the algorithms themselves live outside this crate;
//! a session only holds handles implementing these traits.

/// Errors reported by signing/encryption capabilities.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Produces the electronic signature over an order data digest.
pub trait SigningCapability: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Encrypts outgoing and decrypts incoming order data.
pub trait EncryptionCapability: Send + Sync {
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}
