//! Content Encryption
//!
//! Password-based encryption for sensitive node content.
//!
//! - **Cipher**: AES-256-GCM with a random 96-bit nonce
//! - **Key derivation**: PBKDF2-HMAC-SHA256 with a random 128-bit salt
//! - **Encoding**: ciphertext, salt and nonce are stored as standard base64
//!
//! Nodes only see the [`ContentCipher`] trait. Plaintext leaves this module
//! wrapped in [`Zeroizing`] and reaches callers as an [`UnlockedContent`]
//! handle, so it is wiped when the handle is dropped.

mod error;

pub use error::CryptoError;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Algorithm identifier recorded in metadata
pub const ALGORITHM: &str = "AES-256-GCM";

/// Key derivation identifier recorded in metadata
pub const KDF: &str = "PBKDF2-HMAC-SHA256";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const DEFAULT_SALT_LEN: usize = 16;
const DEFAULT_ITERATIONS: u32 = 100_000;

/// Upper bound on PBKDF2 iterations accepted from config or stored metadata
pub const MAX_ITERATIONS: u32 = DEFAULT_ITERATIONS * 10;

fn check_iterations(iterations: u32) -> Result<(), CryptoError> {
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return Err(CryptoError::InvalidIterations(iterations));
    }
    Ok(())
}

/// Parameters needed to decrypt a stored ciphertext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionMetadata {
    pub algorithm: String,
    pub kdf: String,
    pub iterations: u32,
    /// Base64 salt used for key derivation
    pub salt: String,
    /// Base64 AES-GCM nonce
    pub nonce: String,
    pub encrypted_at: DateTime<Utc>,
}

/// Output of a successful encryption
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedPayload {
    /// Base64 ciphertext (includes the GCM tag)
    pub ciphertext: String,
    pub metadata: EncryptionMetadata,
}

/// Encryption collaborator used by nodes
///
/// Implementations must not panic; every failure is reported as a
/// [`CryptoError`] so nodes can fail closed.
pub trait ContentCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str, password: &str) -> Result<EncryptedPayload, CryptoError>;

    fn decrypt(
        &self,
        ciphertext: &str,
        password: &str,
        metadata: &EncryptionMetadata,
    ) -> Result<Zeroizing<String>, CryptoError>;
}

/// Tuning for [`PasswordCipher`]
#[derive(Debug, Clone)]
pub struct CipherConfig {
    /// PBKDF2 iteration count for new ciphertexts
    pub iterations: u32,
    /// Salt length in bytes
    pub salt_len: usize,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt_len: DEFAULT_SALT_LEN,
        }
    }
}

/// AES-256-GCM cipher keyed from a password
#[derive(Debug, Clone, Default)]
pub struct PasswordCipher {
    config: CipherConfig,
}

impl PasswordCipher {
    pub fn new(config: CipherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CipherConfig {
        &self.config
    }

    fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key[..]);
        key
    }

    fn decode(field: &'static str, value: &str) -> Result<Vec<u8>, CryptoError> {
        STANDARD
            .decode(value)
            .map_err(|e| CryptoError::InvalidEncoding {
                field,
                reason: e.to_string(),
            })
    }
}

impl ContentCipher for PasswordCipher {
    fn encrypt(&self, plaintext: &str, password: &str) -> Result<EncryptedPayload, CryptoError> {
        if password.is_empty() {
            return Err(CryptoError::EmptyPassword);
        }
        check_iterations(self.config.iterations)?;

        let mut rng = rand::thread_rng();
        let mut salt = vec![0u8; self.config.salt_len];
        rng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let key = Self::derive_key(password, &salt, self.config.iterations);
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(EncryptedPayload {
            ciphertext: STANDARD.encode(ciphertext),
            metadata: EncryptionMetadata {
                algorithm: ALGORITHM.to_string(),
                kdf: KDF.to_string(),
                iterations: self.config.iterations,
                salt: STANDARD.encode(&salt),
                nonce: STANDARD.encode(nonce),
                encrypted_at: Utc::now(),
            },
        })
    }

    fn decrypt(
        &self,
        ciphertext: &str,
        password: &str,
        metadata: &EncryptionMetadata,
    ) -> Result<Zeroizing<String>, CryptoError> {
        if metadata.algorithm != ALGORITHM || metadata.kdf != KDF {
            return Err(CryptoError::UnsupportedAlgorithm(format!(
                "{} / {}",
                metadata.algorithm, metadata.kdf
            )));
        }
        check_iterations(metadata.iterations)?;

        let salt = Self::decode("salt", &metadata.salt)?;
        let nonce = Self::decode("nonce", &metadata.nonce)?;
        if nonce.len() != NONCE_LEN {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_LEN,
                actual: nonce.len(),
            });
        }
        let ciphertext = Self::decode("ciphertext", ciphertext)?;

        let key = Self::derive_key(password, &salt, metadata.iterations);
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
                .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?,
        );

        let text = std::str::from_utf8(plaintext.as_slice()).map_err(|_| CryptoError::InvalidUtf8)?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Plaintext of one node, valid for as long as the caller keeps the handle
///
/// Dropping the handle wipes the plaintext. Passing it to
/// `NodeBehavior::to_object_with_content` is the only way decrypted content
/// reaches a serialized record.
pub struct UnlockedContent {
    node_id: String,
    content: Zeroizing<String>,
}

impl UnlockedContent {
    pub(crate) fn new(node_id: String, content: Zeroizing<String>) -> Self {
        Self { node_id, content }
    }

    /// Node this plaintext belongs to
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Borrow the plaintext
    pub fn expose(&self) -> &str {
        self.content.as_str()
    }
}

impl std::fmt::Debug for UnlockedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedContent")
            .field("node_id", &self.node_id)
            .field("content", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod crypto_test;
