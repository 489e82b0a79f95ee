use crypto_utils::PrivateKey;
use eth_core::Address;

use crate::error::KeystoreError;
use crate::manager::Keystore;

/// An unencrypted private key held in memory. The password is ignored.
#[derive(Debug)]
pub struct PlainKeystore {
    key: PrivateKey,
    address: Address,
}

impl PlainKeystore {
    pub fn new(key: PrivateKey) -> Result<Self, KeystoreError> {
        let address = Address::from_private_key(key.as_bytes())?;
        Ok(Self { key, address })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeystoreError> {
        Self::new(PrivateKey::from_slice(bytes)?)
    }

    /// Accepts hex with or without `0x`.
    pub fn from_hex(hex_key: &str) -> Result<Self, KeystoreError> {
        Self::new(PrivateKey::from_hex(hex_key)?)
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl Keystore for PlainKeystore {
    fn addresses(&self) -> Vec<Address> {
        vec![self.address]
    }

    fn private_key(&self, _password: &str, account: &Address) -> Result<PrivateKey, KeystoreError> {
        if *account != self.address {
            return Err(KeystoreError::AddressNotFound(account.to_checksum()));
        }
        Ok(PrivateKey::from_slice(self.key.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn from_hex_derives_address() {
        let keystore = PlainKeystore::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            keystore.address().to_checksum(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
        assert_eq!(keystore.addresses(), vec![keystore.address()]);
    }

    #[test]
    fn returns_key_for_own_address() {
        let keystore = PlainKeystore::from_hex(KEY_ONE).unwrap();
        let key = keystore.private_key("", &keystore.address()).unwrap();
        assert_eq!(key.as_bytes()[31], 1);
    }

    #[test]
    fn zero_key_rejected() {
        assert!(matches!(
            PlainKeystore::from_slice(&[0u8; 32]),
            Err(KeystoreError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(PlainKeystore::from_hex("0xnothex").is_err());
    }

    #[test]
    fn other_address_not_found() {
        let keystore = PlainKeystore::from_hex(KEY_ONE).unwrap();
        assert!(matches!(
            keystore.private_key("", &Address::ZERO),
            Err(KeystoreError::AddressNotFound(_))
        ));
    }
}
