//! Crypto error types.

use thiserror::Error;

/// Content encryption errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Key derivation iteration count out of range: {0}")]
    InvalidIterations(u32),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong password or tampered ciphertext (AEAD tag mismatch)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid base64 in {field}: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },

    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("Decrypted content is not valid UTF-8")]
    InvalidUtf8,
}
