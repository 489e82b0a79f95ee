use bip32::{DerivationPath, XPrv};
use crypto_utils::PrivateKey;
use zeroize::Zeroize;

use crate::error::KeystoreError;

/// BIP-44 Ethereum external chain: m/purpose'/coin_type'/account'/change
pub const DEFAULT_ROOT_PATH: &str = "m/44'/60'/0'/0";

/// Parse and normalize a BIP-32 path string.
pub fn parse_path(path: &str) -> Result<DerivationPath, KeystoreError> {
    path.trim()
        .parse()
        .map_err(|e: bip32::Error| KeystoreError::DerivationFailed(format!("{path}: {e}")))
}

/// Path of the non-hardened child `index` under `root`.
pub fn child_path(root: &str, index: u32) -> Result<String, KeystoreError> {
    if index >= 0x8000_0000 {
        return Err(KeystoreError::DerivationFailed(format!(
            "Child index {index} is in the hardened range"
        )));
    }
    let root = parse_path(root)?;
    Ok(format!("{}/{index}", root))
}

/// Derive a secp256k1 private key from seed using BIP-32
pub fn derive_private_key(seed: &[u8], path: &str) -> Result<PrivateKey, KeystoreError> {
    let path = parse_path(path)?;

    let xprv = XPrv::derive_from_path(seed, &path)
        .map_err(|e| KeystoreError::DerivationFailed(e.to_string()))?;

    let mut private_key_bytes: [u8; 32] = xprv.to_bytes().into();
    let key = PrivateKey::from_slice(&private_key_bytes);
    private_key_bytes.zeroize();
    Ok(key?)
}
