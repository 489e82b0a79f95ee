use crypto_utils::CryptoError;
use thiserror::Error;

/// Ethereum codec and signing errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid abi type: {0}")]
    InvalidAbiType(String),

    #[error("abi item not found: {0}")]
    AbiItemNotFound(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(String),
}

impl From<CryptoError> for EthError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidPrivateKey(msg) => EthError::InvalidPrivateKey(msg),
            CryptoError::InvalidPublicKey(msg) => EthError::InvalidPublicKey(msg),
            CryptoError::InvalidSignature(msg) => EthError::InvalidSignature(msg),
            other => EthError::SigningError(other.to_string()),
        }
    }
}

impl From<alloy_rlp::Error> for EthError {
    fn from(err: alloy_rlp::Error) -> Self {
        EthError::Decoding(format!("rlp: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = EthError::InvalidPrivateKey("key too short".into());
        assert_eq!(err.to_string(), "invalid private key: key too short");
    }

    #[test]
    fn display_invalid_address() {
        let err = EthError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn display_encoding_error() {
        let err = EthError::Encoding("uint8 value out of range".into());
        assert_eq!(err.to_string(), "encoding error: uint8 value out of range");
    }

    #[test]
    fn display_decoding_error() {
        let err = EthError::Decoding("offset 96 out of bounds".into());
        assert_eq!(err.to_string(), "decoding error: offset 96 out of bounds");
    }

    #[test]
    fn display_abi_item_not_found() {
        let err = EthError::AbiItemNotFound("function transfer".into());
        assert_eq!(err.to_string(), "abi item not found: function transfer");
    }

    #[test]
    fn crypto_errors_keep_their_category() {
        let err: EthError = CryptoError::InvalidPrivateKey("zero".into()).into();
        assert!(matches!(err, EthError::InvalidPrivateKey(_)));

        let err: EthError = CryptoError::InvalidSignature("v".into()).into();
        assert!(matches!(err, EthError::InvalidSignature(_)));

        let err: EthError = CryptoError::SigningFailed("boom".into()).into();
        assert!(matches!(err, EthError::SigningError(_)));
    }

    #[test]
    fn rlp_errors_become_decoding_errors() {
        let err: EthError = alloy_rlp::Error::InputTooShort.into();
        assert!(matches!(err, EthError::Decoding(_)));
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(EthError::InvalidPrivateKey("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
