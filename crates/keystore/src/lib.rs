//! Encrypted key storage for the Ethereum core.
//!
//! - [`KeystoreV3`]: standard keystore files (scrypt / PBKDF2, AES-128 CTR / CBC)
//! - [`HdKeystore`]: BIP-39 / BIP-32 wallets with an encrypted seed
//! - [`PlainKeystore`]: an in-memory raw key
//! - [`KeystoreManager`]: address lookup across many keystores
//! - [`signer`]: transaction and message signing through the manager

pub mod config;
pub mod crypto;
pub mod error;
pub mod hd;
pub mod hd_derivation;
pub mod manager;
pub mod mnemonic;
pub mod plain;
pub mod signer;
pub mod v3;

pub use config::{CipherChoice, KdfChoice, LockOptions};
pub use error::KeystoreError;
pub use hd::HdKeystore;
pub use manager::{Keystore, KeystoreManager};
pub use plain::PlainKeystore;
pub use v3::KeystoreV3;
