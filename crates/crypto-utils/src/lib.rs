//! # crypto-utils
//!
//! Primitive adapters used by the Ethereum core: Keccak-256, secp256k1
//! recoverable signatures, AES-128 (CTR/CBC), scrypt/PBKDF2 key derivation
//! and zeroizing containers for secret material.

pub mod cipher;
pub mod error;
pub mod hash;
pub mod kdf;
pub mod secp256k1;
pub mod secret;

pub use error::CryptoError;
pub use hash::keccak256;
pub use secret::{PrivateKey, SecretBytes};
