//! Tests for password-based content encryption

#[cfg(test)]
mod tests {
    use crate::crypto::{
        CipherConfig, ContentCipher, CryptoError, PasswordCipher, ALGORITHM, KDF, MAX_ITERATIONS,
    };

    /// Low iteration count keeps the suite fast
    fn cipher() -> PasswordCipher {
        PasswordCipher::new(CipherConfig {
            iterations: 1_000,
            ..CipherConfig::default()
        })
    }

    #[test]
    fn test_encrypt_then_decrypt_returns_plaintext() {
        let cipher = cipher();
        let payload = cipher.encrypt("secret plan", "hunter2").unwrap();

        assert_ne!(payload.ciphertext, "secret plan");
        assert_eq!(payload.metadata.algorithm, ALGORITHM);
        assert_eq!(payload.metadata.kdf, KDF);
        assert_eq!(payload.metadata.iterations, 1_000);

        let plaintext = cipher
            .decrypt(&payload.ciphertext, "hunter2", &payload.metadata)
            .unwrap();
        assert_eq!(plaintext.as_str(), "secret plan");
    }

    #[test]
    fn test_wrong_password_fails() {
        let cipher = cipher();
        let payload = cipher.encrypt("secret", "right").unwrap();

        let result = cipher.decrypt(&payload.ciphertext, "wrong", &payload.metadata);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_each_encryption_uses_fresh_salt_and_nonce() {
        let cipher = cipher();
        let first = cipher.encrypt("same", "pw").unwrap();
        let second = cipher.encrypt("same", "pw").unwrap();

        assert_ne!(first.metadata.salt, second.metadata.salt);
        assert_ne!(first.metadata.nonce, second.metadata.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_empty_password_rejected() {
        let result = cipher().encrypt("secret", "");
        assert!(matches!(result, Err(CryptoError::EmptyPassword)));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let cipher = PasswordCipher::new(CipherConfig {
            iterations: 0,
            ..CipherConfig::default()
        });
        assert!(matches!(
            cipher.encrypt("secret", "pw"),
            Err(CryptoError::InvalidIterations(0))
        ));
    }

    #[test]
    fn test_excessive_stored_iterations_rejected() {
        let cipher = cipher();
        let mut payload = cipher.encrypt("secret", "pw").unwrap();
        payload.metadata.iterations = u32::MAX;

        let result = cipher.decrypt(&payload.ciphertext, "pw", &payload.metadata);
        assert!(matches!(result, Err(CryptoError::InvalidIterations(u32::MAX))));

        let oversized = PasswordCipher::new(CipherConfig {
            iterations: MAX_ITERATIONS + 1,
            ..CipherConfig::default()
        });
        assert!(matches!(
            oversized.encrypt("secret", "pw"),
            Err(CryptoError::InvalidIterations(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = cipher();
        let payload = cipher.encrypt("secret", "pw").unwrap();
        let other = cipher.encrypt("different", "pw").unwrap();

        let result = cipher.decrypt(&other.ciphertext, "pw", &payload.metadata);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let cipher = cipher();
        let mut payload = cipher.encrypt("secret", "pw").unwrap();
        payload.metadata.algorithm = "ROT13".to_string();

        let result = cipher.decrypt(&payload.ciphertext, "pw", &payload.metadata);
        assert!(matches!(result, Err(CryptoError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_bad_base64_reports_field() {
        let cipher = cipher();
        let mut payload = cipher.encrypt("secret", "pw").unwrap();
        payload.metadata.salt = "not base64!".to_string();

        match cipher.decrypt(&payload.ciphertext, "pw", &payload.metadata) {
            Err(CryptoError::InvalidEncoding { field, .. }) => assert_eq!(field, "salt"),
            other => panic!("expected InvalidEncoding, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_short_nonce_rejected() {
        let cipher = cipher();
        let mut payload = cipher.encrypt("secret", "pw").unwrap();
        payload.metadata.nonce = "AAAA".to_string();

        let result = cipher.decrypt(&payload.ciphertext, "pw", &payload.metadata);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidNonceLength {
                expected: 12,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let payload = cipher().encrypt("secret", "pw").unwrap();
        let value = serde_json::to_value(&payload.metadata).unwrap();
        assert!(value.get("encryptedAt").is_some());
        assert!(value.get("encrypted_at").is_none());
    }
}
