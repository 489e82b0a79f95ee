use thiserror::Error;

use crypto_utils::CryptoError;
use eth_core::EthError;

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("Invalid password")]
    InvalidPassword,

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid keystore format: {0}")]
    InvalidFormat(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<CryptoError> for KeystoreError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidPrivateKey(msg) => KeystoreError::InvalidPrivateKey(msg),
            CryptoError::UnsupportedAlgorithm(msg) => KeystoreError::UnsupportedAlgorithm(msg),
            CryptoError::KdfFailed(msg) => KeystoreError::DerivationFailed(msg),
            CryptoError::EncryptionFailed(msg) => KeystoreError::EncryptionFailed(msg),
            CryptoError::DecryptionFailed(msg) => KeystoreError::DecryptionFailed(msg),
            other => KeystoreError::DecryptionFailed(other.to_string()),
        }
    }
}

impl From<EthError> for KeystoreError {
    fn from(e: EthError) -> Self {
        match e {
            EthError::InvalidPrivateKey(msg) => KeystoreError::InvalidPrivateKey(msg),
            other => KeystoreError::SigningFailed(other.to_string()),
        }
    }
}

impl From<std::io::Error> for KeystoreError {
    fn from(e: std::io::Error) -> Self {
        KeystoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for KeystoreError {
    fn from(e: serde_json::Error) -> Self {
        KeystoreError::InvalidFormat(format!("JSON: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_password() {
        assert_eq!(KeystoreError::InvalidPassword.to_string(), "Invalid password");
    }

    #[test]
    fn display_invalid_format_names_field() {
        let err = KeystoreError::InvalidFormat("crypto.ciphertext must be 32 bytes".into());
        assert_eq!(
            err.to_string(),
            "Invalid keystore format: crypto.ciphertext must be 32 bytes"
        );
    }

    #[test]
    fn crypto_unsupported_maps_to_unsupported() {
        let err: KeystoreError = CryptoError::UnsupportedAlgorithm("cipher aes-256-gcm".into()).into();
        assert!(matches!(err, KeystoreError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn crypto_private_key_maps_to_private_key() {
        let err: KeystoreError = CryptoError::InvalidPrivateKey("zero".into()).into();
        assert!(matches!(err, KeystoreError::InvalidPrivateKey(_)));
    }

    #[test]
    fn json_error_maps_to_invalid_format() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: KeystoreError = json_err.into();
        assert!(matches!(err, KeystoreError::InvalidFormat(_)));
    }

    #[test]
    fn io_error_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: KeystoreError = io.into();
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}
