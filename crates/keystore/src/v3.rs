//! Version 3 ("Web3 Secret Storage") keystore files holding one private key.

use std::str::FromStr;

use crypto_utils::PrivateKey;
use eth_core::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LockOptions;
use crate::crypto::{CryptoJson, EncryptedSecret};
use crate::error::KeystoreError;
use crate::manager::Keystore;

/// The only file version this module reads and writes.
pub const VERSION: u32 = 3;

const CIPHERTEXT_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct KeystoreV3File {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(alias = "Crypto")]
    crypto: CryptoJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    version: u32,
}

/// An encrypted private key with its (optional) plaintext address.
#[derive(Debug, Clone)]
pub struct KeystoreV3 {
    address: Option<String>,
    id: Option<String>,
    secret: EncryptedSecret,
}

impl KeystoreV3 {
    /// Encrypts `private_key` under `password`.
    ///
    /// The record gets a random UUID v4 id and the lowercase address.
    pub fn lock(
        private_key: &PrivateKey,
        password: &str,
        options: &LockOptions,
    ) -> Result<Self, KeystoreError> {
        let address = Address::from_private_key(private_key.as_bytes())?;
        let secret = EncryptedSecret::seal(private_key.as_bytes(), password, options)?;

        Ok(Self {
            address: Some(address.to_lower_hex()),
            id: Some(Uuid::new_v4().to_string()),
            secret,
        })
    }

    /// Decrypts the private key.
    pub fn unlock(&self, password: &str) -> Result<PrivateKey, KeystoreError> {
        let plaintext = self.secret.open(password)?;
        let key = PrivateKey::from_slice(&plaintext)?;

        if let Some(expected) = self.address() {
            let derived = Address::from_private_key(key.as_bytes())?;
            if derived != expected {
                return Err(KeystoreError::InvalidFormat(format!(
                    "address {expected} does not match the decrypted key"
                )));
            }
        }
        Ok(key)
    }

    /// Parses and validates a keystore file.
    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        let file: KeystoreV3File = serde_json::from_str(json)?;
        if file.version != VERSION {
            return Err(KeystoreError::InvalidFormat(format!(
                "version must be {VERSION}, got {}",
                file.version
            )));
        }

        let secret = EncryptedSecret::from_json(&file.crypto)?;
        if secret.ciphertext().len() != CIPHERTEXT_LEN {
            return Err(KeystoreError::InvalidFormat(format!(
                "crypto.ciphertext must be {CIPHERTEXT_LEN} bytes, got {}",
                secret.ciphertext().len()
            )));
        }

        Ok(Self {
            address: file.address,
            id: file.id,
            secret,
        })
    }

    pub fn to_json(&self) -> Result<String, KeystoreError> {
        let file = KeystoreV3File {
            address: self.address.clone(),
            crypto: self.secret.to_json(),
            id: self.id.clone(),
            version: VERSION,
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// The stored address, or `None` when it is missing or unparseable.
    pub fn address(&self) -> Option<Address> {
        let raw = self.address.as_deref()?;
        Address::from_str(raw)
            .ok()
            .filter(|address| !address.is_contract_deployment())
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn encrypted(&self) -> &EncryptedSecret {
        &self.secret
    }
}

impl Keystore for KeystoreV3 {
    fn addresses(&self) -> Vec<Address> {
        match (self.address(), self.address.as_deref()) {
            (Some(address), _) => vec![address],
            (None, Some(raw)) => {
                tracing::warn!(address = raw, "keystore address is invalid, skipping");
                Vec::new()
            }
            (None, None) => Vec::new(),
        }
    }

    fn private_key(&self, password: &str, account: &Address) -> Result<PrivateKey, KeystoreError> {
        if self.address() != Some(*account) {
            return Err(KeystoreError::AddressNotFound(account.to_checksum()));
        }
        self.unlock(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KdfChoice;
    use crypto_utils::cipher::AesMode;

    // Web3 Secret Storage PBKDF2 test vector.
    const PBKDF2_VECTOR: &str = r#"{
        "crypto": {
            "cipher": "aes-128-ctr",
            "cipherparams": { "iv": "6087dab2f9fdbbfaddc31a909735c1e6" },
            "ciphertext": "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
            "kdf": "pbkdf2",
            "kdfparams": {
                "c": 262144,
                "dklen": 32,
                "prf": "hmac-sha256",
                "salt": "ae3cd4e7013836a3df6bd7241b12db061dbe2c6785853cce422d148a624ce0bd"
            },
            "mac": "517ead924a9d0dc3124507e3393d175ce3ff7c1e96529c6c555ce9e51205e9b2"
        },
        "id": "3198bc9c-6672-5ab3-d995-4942343ae5b6",
        "version": 3
    }"#;

    fn fast_options() -> LockOptions {
        LockOptions::new(KdfChoice::scrypt(1024, 8, 1), AesMode::Ctr)
    }

    fn key_one() -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        PrivateKey::from_slice(&bytes).unwrap()
    }

    #[test]
    fn pbkdf2_vector_unlocks() {
        let keystore = KeystoreV3::from_json(PBKDF2_VECTOR).unwrap();
        assert_eq!(keystore.id(), Some("3198bc9c-6672-5ab3-d995-4942343ae5b6"));
        assert!(keystore.address().is_none());

        let key = keystore.unlock("testpassword").unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "7a28b5ba57c53603b0b07b56bba752f7784bf506fa95edc395f5cf6c7514fe9d"
        );
    }

    #[test]
    fn lock_unlock_roundtrip() {
        let keystore = KeystoreV3::lock(&key_one(), "pw", &fast_options()).unwrap();
        assert_eq!(
            keystore.address.as_deref(),
            Some("7e5f4552091a69125d5dfcb7b8c2659029395bdf")
        );
        assert_eq!(keystore.unlock("pw").unwrap(), key_one());
    }

    #[test]
    fn wrong_password_rejected() {
        let keystore = KeystoreV3::lock(&key_one(), "pw", &fast_options()).unwrap();
        assert!(matches!(keystore.unlock("nope"), Err(KeystoreError::InvalidPassword)));
    }

    #[test]
    fn json_roundtrip_keeps_id_and_address() {
        let keystore = KeystoreV3::lock(&key_one(), "pw", &fast_options()).unwrap();
        let json = keystore.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["crypto"]["kdf"], "scrypt");
        let id = value["id"].as_str().unwrap();
        assert_eq!(Uuid::parse_str(id).unwrap().get_version_num(), 4);

        let parsed = KeystoreV3::from_json(&json).unwrap();
        assert_eq!(parsed.id(), keystore.id());
        assert_eq!(parsed.address(), keystore.address());
        assert_eq!(parsed.unlock("pw").unwrap(), key_one());
    }

    #[test]
    fn capitalized_crypto_key_accepted() {
        let json = PBKDF2_VECTOR.replace("\"crypto\"", "\"Crypto\"");
        assert!(KeystoreV3::from_json(&json).is_ok());
    }

    #[test]
    fn wrong_version_rejected() {
        let json = PBKDF2_VECTOR.replace("\"version\": 3", "\"version\": 1");
        assert!(matches!(
            KeystoreV3::from_json(&json),
            Err(KeystoreError::InvalidFormat(_))
        ));
    }

    #[test]
    fn long_ciphertext_rejected() {
        let json = PBKDF2_VECTOR.replace(
            "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa46",
            "5318b4d5bcd28de64ee5559e671353e16f075ecae9f99c7a79a38af5f869aa4600",
        );
        match KeystoreV3::from_json(&json) {
            Err(KeystoreError::InvalidFormat(msg)) => assert!(msg.contains("crypto.ciphertext")),
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_cipher_rejected() {
        let json = PBKDF2_VECTOR.replace("aes-128-ctr", "aes-256-ctr");
        assert!(matches!(
            KeystoreV3::from_json(&json),
            Err(KeystoreError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn garbage_json_is_invalid_format() {
        assert!(matches!(
            KeystoreV3::from_json("not json"),
            Err(KeystoreError::InvalidFormat(_))
        ));
    }

    #[test]
    fn invalid_address_is_skipped() {
        let json = PBKDF2_VECTOR.replace("\"version\": 3", "\"version\": 3, \"address\": \"zz\"");
        let keystore = KeystoreV3::from_json(&json).unwrap();
        assert!(keystore.addresses().is_empty());
    }

    #[test]
    fn private_key_for_other_account_is_not_found() {
        let keystore = KeystoreV3::lock(&key_one(), "pw", &fast_options()).unwrap();
        let other = Address::from([0x11; 20]);
        assert!(matches!(
            keystore.private_key("pw", &other),
            Err(KeystoreError::AddressNotFound(_))
        ));
    }
}
