//! The `crypto` section shared by V3 and HD keystore files.
//!
//! A password is stretched by scrypt or PBKDF2 into `dk`. `dk[0..16]` is the
//! AES-128 key and `mac = keccak256(dk[16..32] || ciphertext)` authenticates
//! the ciphertext. Every structural check runs when the section is parsed,
//! so [`EncryptedSecret::open`] only fails on a wrong password or a
//! corrupted ciphertext.

use crypto_utils::cipher::{self, AesMode, AES128_KEY_LEN, IV_LEN};
use crypto_utils::hash::keccak256_concat;
use crypto_utils::kdf::{self, Prf};
use crypto_utils::SecretBytes;
use eth_core::utils::strip_hex_prefix;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::config::{KdfChoice, LockOptions};
use crate::error::KeystoreError;

/// MAC length in bytes.
pub const MAC_LEN: usize = 32;

/// Largest scrypt `n` accepted from a file (1 GiB of memory at r = 8).
pub const MAX_SCRYPT_N: u64 = 1 << 20;

/// Largest scrypt working set (`128 * r * n` bytes) accepted from a file.
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Largest scrypt parallelism accepted from a file.
pub const MAX_SCRYPT_P: u32 = 16;

/// `crypto` as it appears in JSON. All byte fields are lowercase hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoJson {
    pub cipher: String,
    pub cipherparams: CipherParamsJson,
    pub ciphertext: String,
    pub kdf: String,
    pub kdfparams: serde_json::Value,
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CipherParamsJson {
    pub iv: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScryptParamsJson {
    dklen: usize,
    n: u64,
    r: u32,
    p: u32,
    salt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Pbkdf2ParamsJson {
    c: u32,
    dklen: usize,
    prf: String,
    salt: String,
}

/// KDF parameters together with the salt they were used with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub choice: KdfChoice,
    pub salt: Vec<u8>,
}

/// A validated, still encrypted secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    kdf: KdfParams,
    cipher: AesMode,
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
    mac: [u8; MAC_LEN],
}

impl EncryptedSecret {
    /// Encrypts `secret` under `password` with a fresh salt and IV.
    pub fn seal(secret: &[u8], password: &str, options: &LockOptions) -> Result<Self, KeystoreError> {
        let kdf = KdfParams {
            choice: options.kdf,
            salt: kdf::generate_salt().to_vec(),
        };
        let iv = cipher::generate_iv();

        let dk = derive_key(&kdf, password)?;
        let ciphertext = cipher::aes128_encrypt(&dk[..AES128_KEY_LEN], &iv, secret, options.cipher)
            .map_err(|e| KeystoreError::EncryptionFailed(e.to_string()))?;
        let mac = compute_mac(&dk, &ciphertext);

        Ok(Self {
            kdf,
            cipher: options.cipher,
            iv,
            ciphertext,
            mac,
        })
    }

    /// Verifies the MAC and decrypts.
    ///
    /// Returns [`KeystoreError::InvalidPassword`] when the MAC does not match.
    pub fn open(&self, password: &str) -> Result<SecretBytes, KeystoreError> {
        let dk = derive_key(&self.kdf, password)?;
        let mac = compute_mac(&dk, &self.ciphertext);
        if !bool::from(mac.as_slice().ct_eq(self.mac.as_slice())) {
            return Err(KeystoreError::InvalidPassword);
        }

        cipher::aes128_decrypt(&dk[..AES128_KEY_LEN], &self.iv, &self.ciphertext, self.cipher)
            .map_err(|e| KeystoreError::DecryptionFailed(e.to_string()))
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    pub fn cipher(&self) -> AesMode {
        self.cipher
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Parses and validates a `crypto` section.
    pub fn from_json(json: &CryptoJson) -> Result<Self, KeystoreError> {
        let cipher = AesMode::from_name(&json.cipher)?;
        let kdf = parse_kdf(&json.kdf, &json.kdfparams)?;

        let iv: [u8; IV_LEN] = decode_fixed("crypto.cipherparams.iv", &json.cipherparams.iv)?;
        let mac: [u8; MAC_LEN] = decode_fixed("crypto.mac", &json.mac)?;
        let ciphertext = decode_field("crypto.ciphertext", &json.ciphertext)?;
        if ciphertext.is_empty() {
            return Err(KeystoreError::InvalidFormat("crypto.ciphertext is empty".into()));
        }
        if cipher == AesMode::Cbc && ciphertext.len() % IV_LEN != 0 {
            return Err(KeystoreError::InvalidFormat(format!(
                "crypto.ciphertext length {} is not a multiple of the AES block",
                ciphertext.len()
            )));
        }

        Ok(Self {
            kdf,
            cipher,
            iv,
            ciphertext,
            mac,
        })
    }

    pub fn to_json(&self) -> CryptoJson {
        let salt = hex::encode(&self.kdf.salt);
        let kdfparams = match self.kdf.choice {
            KdfChoice::Scrypt { n, r, p, dklen } => {
                serde_json::json!(ScryptParamsJson { dklen, n, r, p, salt })
            }
            KdfChoice::Pbkdf2 { c, prf, dklen } => serde_json::json!(Pbkdf2ParamsJson {
                c,
                dklen,
                prf: prf.name().to_string(),
                salt,
            }),
        };

        CryptoJson {
            cipher: self.cipher.name().to_string(),
            cipherparams: CipherParamsJson {
                iv: hex::encode(self.iv),
            },
            ciphertext: hex::encode(&self.ciphertext),
            kdf: self.kdf.choice.name().to_string(),
            kdfparams,
            mac: hex::encode(self.mac),
        }
    }
}

fn derive_key(params: &KdfParams, password: &str) -> Result<SecretBytes, KeystoreError> {
    let dk = match params.choice {
        KdfChoice::Scrypt { n, r, p, dklen } => {
            kdf::scrypt(password.as_bytes(), &params.salt, n, r, p, dklen)?
        }
        KdfChoice::Pbkdf2 { c, prf, dklen } => {
            kdf::pbkdf2(password.as_bytes(), &params.salt, c, dklen, prf)?
        }
    };
    Ok(dk)
}

fn compute_mac(dk: &[u8], ciphertext: &[u8]) -> [u8; MAC_LEN] {
    keccak256_concat(&[&dk[AES128_KEY_LEN..2 * AES128_KEY_LEN], ciphertext])
}

fn parse_kdf(name: &str, params: &serde_json::Value) -> Result<KdfParams, KeystoreError> {
    let (choice, salt) = match name {
        "scrypt" => {
            let p: ScryptParamsJson = serde_json::from_value(params.clone())
                .map_err(|e| KeystoreError::InvalidFormat(format!("crypto.kdfparams: {e}")))?;
            if p.n < 2 || !p.n.is_power_of_two() || p.n > MAX_SCRYPT_N {
                return Err(KeystoreError::InvalidFormat(format!(
                    "crypto.kdfparams.n {} out of range",
                    p.n
                )));
            }
            if p.r == 0 || p.p == 0 {
                return Err(KeystoreError::InvalidFormat(
                    "crypto.kdfparams.r and p must be non-zero".into(),
                ));
            }
            let memory = 128u64
                .checked_mul(u64::from(p.r))
                .and_then(|m| m.checked_mul(p.n))
                .filter(|m| *m <= MAX_SCRYPT_MEMORY);
            if memory.is_none() {
                return Err(KeystoreError::InvalidFormat(format!(
                    "crypto.kdfparams needs more than {MAX_SCRYPT_MEMORY} bytes (n {}, r {})",
                    p.n, p.r
                )));
            }
            if p.p > MAX_SCRYPT_P {
                return Err(KeystoreError::InvalidFormat(format!(
                    "crypto.kdfparams.p {} exceeds {MAX_SCRYPT_P}",
                    p.p
                )));
            }
            (
                KdfChoice::Scrypt { n: p.n, r: p.r, p: p.p, dklen: p.dklen },
                p.salt,
            )
        }
        "pbkdf2" => {
            let p: Pbkdf2ParamsJson = serde_json::from_value(params.clone())
                .map_err(|e| KeystoreError::InvalidFormat(format!("crypto.kdfparams: {e}")))?;
            let prf = Prf::from_name(&p.prf)?;
            if p.c == 0 {
                return Err(KeystoreError::InvalidFormat("crypto.kdfparams.c is zero".into()));
            }
            (KdfChoice::Pbkdf2 { c: p.c, prf, dklen: p.dklen }, p.salt)
        }
        other => return Err(KeystoreError::UnsupportedAlgorithm(format!("kdf {other}"))),
    };

    if choice.dklen() < 2 * AES128_KEY_LEN {
        return Err(KeystoreError::InvalidFormat(format!(
            "crypto.kdfparams.dklen must be at least {}, got {}",
            2 * AES128_KEY_LEN,
            choice.dklen()
        )));
    }
    let salt = decode_field("crypto.kdfparams.salt", &salt)?;

    Ok(KdfParams { choice, salt })
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, KeystoreError> {
    hex::decode(strip_hex_prefix(value))
        .map_err(|e| KeystoreError::InvalidFormat(format!("{field}: {e}")))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N], KeystoreError> {
    let bytes = decode_field(field, value)?;
    bytes.as_slice().try_into().map_err(|_| {
        KeystoreError::InvalidFormat(format!("{field} must be {N} bytes, got {}", bytes.len()))
    })
}
