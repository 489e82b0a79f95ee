//! Typed options for locking new keystores.
//!
//! Options serialize with the same wire names used inside keystore files:
//!
//! ```json
//! { "kdf": { "type": "scrypt", "n": 262144, "r": 8, "p": 1, "dklen": 32 },
//!   "cipher": "aes-128-ctr" }
//! ```

use std::str::FromStr;

use crypto_utils::cipher::AesMode;
use crypto_utils::kdf::Prf;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KeystoreError;

/// Derived key length written by default; the minimum the envelope accepts.
pub const DEFAULT_DKLEN: usize = 32;

/// Symmetric cipher for the envelope, named as in keystore files.
pub type CipherChoice = AesMode;

/// Key derivation function and its cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KdfChoice {
    Scrypt {
        n: u64,
        r: u32,
        p: u32,
        #[serde(default = "default_dklen")]
        dklen: usize,
    },
    Pbkdf2 {
        c: u32,
        #[serde(with = "prf_name")]
        prf: Prf,
        #[serde(default = "default_dklen")]
        dklen: usize,
    },
}

impl KdfChoice {
    pub fn scrypt(n: u64, r: u32, p: u32) -> Self {
        KdfChoice::Scrypt { n, r, p, dklen: DEFAULT_DKLEN }
    }

    pub fn pbkdf2(c: u32, prf: Prf) -> Self {
        KdfChoice::Pbkdf2 { c, prf, dklen: DEFAULT_DKLEN }
    }

    /// Wire name written to `crypto.kdf`.
    pub fn name(&self) -> &'static str {
        match self {
            KdfChoice::Scrypt { .. } => "scrypt",
            KdfChoice::Pbkdf2 { .. } => "pbkdf2",
        }
    }

    pub fn dklen(&self) -> usize {
        match self {
            KdfChoice::Scrypt { dklen, .. } | KdfChoice::Pbkdf2 { dklen, .. } => *dklen,
        }
    }
}

impl Default for KdfChoice {
    fn default() -> Self {
        KdfChoice::scrypt(262_144, 8, 1)
    }
}

impl FromStr for KdfChoice {
    type Err = KeystoreError;

    /// Parses a wire name into that KDF with its default cost.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scrypt" => Ok(KdfChoice::default()),
            "pbkdf2" => Ok(KdfChoice::pbkdf2(262_144, Prf::HmacSha256)),
            other => Err(KeystoreError::UnsupportedAlgorithm(format!("kdf {other}"))),
        }
    }
}

/// Options passed to [`KeystoreV3::lock`](crate::v3::KeystoreV3::lock) and
/// the HD keystore constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOptions {
    #[serde(default)]
    pub kdf: KdfChoice,
    #[serde(default = "default_cipher", with = "cipher_name")]
    pub cipher: CipherChoice,
}

impl LockOptions {
    pub fn new(kdf: KdfChoice, cipher: CipherChoice) -> Self {
        Self { kdf, cipher }
    }

    /// Cheaper scrypt cost for interactive use.
    pub fn light() -> Self {
        Self {
            kdf: KdfChoice::scrypt(4096, 8, 6),
            cipher: AesMode::Ctr,
        }
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            kdf: KdfChoice::default(),
            cipher: default_cipher(),
        }
    }
}

fn default_dklen() -> usize {
    DEFAULT_DKLEN
}

fn default_cipher() -> CipherChoice {
    AesMode::Ctr
}

mod prf_name {
    use super::*;

    pub fn serialize<S: Serializer>(prf: &Prf, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(prf.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Prf, D::Error> {
        let name = String::deserialize(deserializer)?;
        Prf::from_name(&name).map_err(serde::de::Error::custom)
    }
}

mod cipher_name {
    use super::*;

    pub fn serialize<S: Serializer>(mode: &AesMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(mode.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AesMode, D::Error> {
        let name = String::deserialize(deserializer)?;
        AesMode::from_name(&name).map_err(serde::de::Error::custom)
    }
}
