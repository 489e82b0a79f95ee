//! Containers for secret material.
//!
//! Both types are zeroed on drop, never print their contents in `Debug`
//! output and compare in constant time.

use std::fmt;
use std::ops::Deref;

use k256::ecdsa::SigningKey;
use rand::RngCore;
use rand_core::OsRng;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Length of a secp256k1 private key in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Variable-length secret bytes (derived keys, seeds, decrypted plaintext).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for SecretBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SecretBytes {}

/// A validated secp256k1 private key.
///
/// Construction checks that the scalar is non-zero and below the curve order,
/// so every `PrivateKey` can sign. It does not implement `Clone`; keys are
/// moved, not copied.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LEN]);

impl PrivateKey {
    /// Validates and wraps raw key bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut key: [u8; PRIVATE_KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey(format!(
                "expected {PRIVATE_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        if let Err(e) = SigningKey::from_bytes((&key).into()) {
            key.zeroize();
            return Err(CryptoError::InvalidPrivateKey(e.to_string()));
        }
        Ok(Self(key))
    }

    /// Parses a hex private key, with or without `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);
        let mut bytes = hex::decode(trimmed)
            .map_err(|e| CryptoError::InvalidPrivateKey(format!("invalid hex: {e}")))?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    /// Generates a fresh key from the operating system RNG.
    pub fn random() -> Self {
        loop {
            let mut bytes = [0u8; PRIVATE_KEY_LEN];
            OsRng.fill_bytes(&mut bytes);
            let key = Self::from_slice(&bytes);
            bytes.zeroize();
            // Out-of-range draws happen with probability ~2^-128.
            if let Ok(key) = key {
                return key;
            }
        }
    }

    /// Exposes the raw scalar for the duration of a signing operation.
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }

    /// Uncompressed SEC1 public key (65 bytes, `0x04` prefix).
    pub fn public_key(&self) -> Result<[u8; 65], CryptoError> {
        crate::secp256k1::private_to_public(&self.0)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for PrivateKey {}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> [u8; 32] {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    }

    #[test]
    fn private_key_accepts_valid_scalar() {
        let key = PrivateKey::from_slice(&key_one()).unwrap();
        assert_eq!(key.as_bytes(), &key_one());
    }

    #[test]
    fn private_key_rejects_zero() {
        let result = PrivateKey::from_slice(&[0u8; 32]);
        assert!(matches!(result, Err(CryptoError::InvalidPrivateKey(_))));
    }

    #[test]
    fn private_key_rejects_curve_order() {
        // n = FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFE BAAEDCE6 AF48A03B BFD25E8C D0364141
        let order =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
                .unwrap();
        assert!(PrivateKey::from_slice(&order).is_err());
    }

    #[test]
    fn private_key_rejects_wrong_length() {
        let result = PrivateKey::from_slice(&[1u8; 31]);
        match result {
            Err(CryptoError::InvalidPrivateKey(msg)) => assert!(msg.contains("31")),
            other => panic!("expected InvalidPrivateKey, got {other:?}"),
        }
    }

    #[test]
    fn private_key_from_hex_with_prefix() {
        let key = PrivateKey::from_hex(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(key.as_bytes(), &key_one());
    }

    #[test]
    fn private_key_debug_is_redacted() {
        let key = PrivateKey::from_slice(&key_one()).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("01"));
    }

    #[test]
    fn random_keys_differ() {
        let a = PrivateKey::random();
        let b = PrivateKey::random();
        assert_ne!(a, b);
    }

    #[test]
    fn secret_bytes_deref_and_len() {
        let secret = SecretBytes::new(vec![1, 2, 3]);
        assert_eq!(&*secret, &[1, 2, 3]);
        assert_eq!(secret.len(), 3);
        assert!(!secret.is_empty());
    }

    #[test]
    fn secret_bytes_manual_zeroize_clears() {
        let mut secret = SecretBytes::new(vec![0xAA; 32]);
        secret.zeroize();
        assert!(secret.is_empty());
    }

    #[test]
    fn secret_bytes_debug_is_redacted() {
        let secret = SecretBytes::new(vec![0xAB; 4]);
        assert_eq!(format!("{secret:?}"), "SecretBytes([REDACTED; 4])");
    }
}
