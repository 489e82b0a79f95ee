//! Resolving account addresses to the keystore that holds their key.

use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crypto_utils::PrivateKey;
use eth_core::Address;

use crate::error::KeystoreError;
use crate::hd::HdKeystore;
use crate::v3::KeystoreV3;

/// A source of private keys for one or more accounts.
pub trait Keystore: Send + Sync {
    /// Valid addresses this keystore can unlock.
    fn addresses(&self) -> Vec<Address>;

    /// Returns the private key for `account`.
    ///
    /// Fails with [`KeystoreError::AddressNotFound`] when the account is not
    /// held here and [`KeystoreError::InvalidPassword`] on a MAC mismatch.
    fn private_key(&self, password: &str, account: &Address) -> Result<PrivateKey, KeystoreError>;

    fn is_hd(&self) -> bool {
        false
    }
}

/// Parses a keystore file, choosing the HD layout when `isHDWallet` is set.
pub fn parse_keystore(json: &str) -> Result<Arc<dyn Keystore>, KeystoreError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let is_hd = value
        .get("isHDWallet")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);

    if is_hd {
        Ok(Arc::new(HdKeystore::from_json(json)?))
    } else {
        Ok(Arc::new(KeystoreV3::from_json(json)?))
    }
}

/// A caller-owned set of keystores.
///
/// Lookups take a read lock; unlocking runs after the lock is released.
#[derive(Default)]
pub struct KeystoreManager {
    keystores: RwLock<Vec<Arc<dyn Keystore>>>,
}

impl KeystoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every file in `dir` whose name ends with `suffix`.
    ///
    /// Files that fail to parse are skipped with a warning. Subdirectories
    /// are not visited.
    pub fn from_dir(dir: impl AsRef<Path>, suffix: Option<&str>) -> Result<Self, KeystoreError> {
        let dir = dir.as_ref();
        let manager = Self::new();

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches_suffix = match suffix {
                Some(suffix) => path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.ends_with(suffix)),
                None => true,
            };
            if matches_suffix {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let loaded = fs::read_to_string(&path)
                .map_err(KeystoreError::from)
                .and_then(|json| parse_keystore(&json));
            match loaded {
                Ok(keystore) => manager.push(keystore),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping keystore file");
                }
            }
        }

        tracing::debug!(dir = %dir.display(), count = manager.len(), "loaded keystores");
        Ok(manager)
    }

    pub fn add<K: Keystore + 'static>(&self, keystore: K) {
        self.push(Arc::new(keystore));
    }

    pub fn push(&self, keystore: Arc<dyn Keystore>) {
        self.keystores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(keystore);
    }

    pub fn len(&self) -> usize {
        self.keystores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Union of valid addresses across all keystores, in insertion order.
    pub fn addresses(&self) -> Vec<Address> {
        let keystores = self.keystores.read().unwrap_or_else(PoisonError::into_inner);
        let mut addresses: Vec<Address> = Vec::new();
        for address in keystores.iter().flat_map(|k| k.addresses()) {
            if address.is_contract_deployment() {
                continue;
            }
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        addresses
    }

    /// The first keystore holding `address`.
    pub fn keystore_for(&self, address: &Address) -> Option<Arc<dyn Keystore>> {
        let keystores = self.keystores.read().unwrap_or_else(PoisonError::into_inner);
        keystores
            .iter()
            .find(|k| k.addresses().contains(address))
            .cloned()
    }

    pub fn private_key(&self, password: &str, address: &Address) -> Result<PrivateKey, KeystoreError> {
        let keystore = self.keystore_for(address).ok_or_else(|| {
            tracing::debug!(address = %address, "no keystore holds address");
            KeystoreError::AddressNotFound(address.to_checksum())
        })?;
        keystore.private_key(password, address)
    }
}
