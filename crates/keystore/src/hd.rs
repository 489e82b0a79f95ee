//! Hierarchical deterministic keystore.
//!
//! The 64-byte BIP-39 seed is encrypted with the same envelope as V3 files.
//! Accounts are the non-hardened children of `root_path`; the file records
//! each derived path and its address so addresses can be listed without the
//! password.

use std::collections::BTreeMap;
use std::str::FromStr;

use crypto_utils::{PrivateKey, SecretBytes};
use eth_core::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LockOptions;
use crate::crypto::{CryptoJson, EncryptedSecret};
use crate::error::KeystoreError;
use crate::hd_derivation::{child_path, derive_private_key, parse_path, DEFAULT_ROOT_PATH};
use crate::manager::Keystore;
use crate::mnemonic::mnemonic_to_seed;
use crate::v3::VERSION;

const SEED_LEN: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HdKeystoreFile {
    #[serde(alias = "Crypto")]
    crypto: CryptoJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    version: u32,
    #[serde(rename = "isHDWallet")]
    is_hd_wallet: bool,
    root_path: String,
    path_to_address: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct HdKeystore {
    root_path: String,
    path_to_address: BTreeMap<String, Address>,
    id: Option<String>,
    secret: EncryptedSecret,
}

impl HdKeystore {
    /// Encrypts the seed of `phrase` and derives the first account.
    pub fn from_mnemonic(
        phrase: &str,
        mnemonic_passphrase: &str,
        password: &str,
        root_path: Option<&str>,
        options: &LockOptions,
    ) -> Result<Self, KeystoreError> {
        let root_path = parse_path(root_path.unwrap_or(DEFAULT_ROOT_PATH))?.to_string();
        let seed = mnemonic_to_seed(phrase, mnemonic_passphrase)?;
        let secret = EncryptedSecret::seal(&seed, password, options)?;

        let mut keystore = Self {
            root_path,
            path_to_address: BTreeMap::new(),
            id: Some(Uuid::new_v4().to_string()),
            secret,
        };
        keystore.add_child(&seed, 0)?;
        Ok(keystore)
    }

    /// Derives the account after the highest recorded index and records it.
    pub fn create_new_child_account(&mut self, password: &str) -> Result<Address, KeystoreError> {
        let index = self.next_index()?;
        let seed = self.seed(password)?;
        self.add_child(&seed, index)
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn path_to_address(&self) -> &BTreeMap<String, Address> {
        &self.path_to_address
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        let file: HdKeystoreFile = serde_json::from_str(json)?;
        if !file.is_hd_wallet {
            return Err(KeystoreError::InvalidFormat("isHDWallet is false".into()));
        }
        if file.version != VERSION {
            return Err(KeystoreError::InvalidFormat(format!(
                "version must be {VERSION}, got {}",
                file.version
            )));
        }
        let root_path = parse_path(&file.root_path)?.to_string();

        let secret = EncryptedSecret::from_json(&file.crypto)?;
        if secret.ciphertext().len() != SEED_LEN {
            return Err(KeystoreError::InvalidFormat(format!(
                "crypto.ciphertext must be {SEED_LEN} bytes, got {}",
                secret.ciphertext().len()
            )));
        }

        let mut path_to_address = BTreeMap::new();
        for (path, raw) in file.path_to_address {
            match Address::from_str(&raw) {
                Ok(address) => {
                    path_to_address.insert(path, address);
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "invalid address in pathToAddress, skipping");
                }
            }
        }

        Ok(Self {
            root_path,
            path_to_address,
            id: file.id,
            secret,
        })
    }

    pub fn to_json(&self) -> Result<String, KeystoreError> {
        let file = HdKeystoreFile {
            crypto: self.secret.to_json(),
            id: self.id.clone(),
            version: VERSION,
            is_hd_wallet: true,
            root_path: self.root_path.clone(),
            path_to_address: self
                .path_to_address
                .iter()
                .map(|(path, address)| (path.clone(), address.to_checksum()))
                .collect(),
        };
        Ok(serde_json::to_string(&file)?)
    }

    fn seed(&self, password: &str) -> Result<SecretBytes, KeystoreError> {
        let seed = self.secret.open(password)?;
        if seed.len() != SEED_LEN {
            return Err(KeystoreError::InvalidFormat(format!(
                "decrypted seed must be {SEED_LEN} bytes, got {}",
                seed.len()
            )));
        }
        Ok(seed)
    }

    fn next_index(&self) -> Result<u32, KeystoreError> {
        let prefix = format!("{}/", self.root_path);
        let highest = self
            .path_to_address
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter_map(|index| index.parse::<u32>().ok())
            .max();

        match highest {
            None => Ok(0),
            Some(index) => index.checked_add(1).ok_or_else(|| {
                KeystoreError::DerivationFailed("Child index space exhausted".into())
            }),
        }
    }

    fn add_child(&mut self, seed: &[u8], index: u32) -> Result<Address, KeystoreError> {
        let path = child_path(&self.root_path, index)?;
        let key = derive_private_key(seed, &path)?;
        let address = Address::from_private_key(key.as_bytes())?;
        tracing::debug!(path = %path, address = %address, "derived HD account");
        self.path_to_address.insert(path, address);
        Ok(address)
    }
}

impl Keystore for HdKeystore {
    fn addresses(&self) -> Vec<Address> {
        self.path_to_address.values().copied().collect()
    }

    fn is_hd(&self) -> bool {
        true
    }

    fn private_key(&self, password: &str, account: &Address) -> Result<PrivateKey, KeystoreError> {
        let path = self
            .path_to_address
            .iter()
            .find(|(_, address)| *address == account)
            .map(|(path, _)| path.clone())
            .ok_or_else(|| KeystoreError::AddressNotFound(account.to_checksum()))?;

        let seed = self.seed(password)?;
        let key = derive_private_key(&seed, &path)?;
        if Address::from_private_key(key.as_bytes())? != *account {
            return Err(KeystoreError::InvalidFormat(format!(
                "pathToAddress entry {path} does not match the seed"
            )));
        }
        Ok(key)
    }
}
