//! EIP-191 `personal_sign` messages.

use crypto_utils::hash::keccak256_concat;
use crypto_utils::secp256k1::{self, RecoverableSignature, SIGNATURE_LEN};

use crate::address::Address;
use crate::error::EthError;

/// `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    keccak256_concat(&[prefix.as_bytes(), message])
}

/// Signs a message with the EIP-191 prefix.
///
/// Returns `r || s || v` with `v` of 27 or 28.
pub fn sign_personal_message(
    message: &[u8],
    private_key: &[u8; 32],
) -> Result<[u8; SIGNATURE_LEN], EthError> {
    let hash = hash_personal_message(message);
    let signature = secp256k1::sign_recoverable(&hash, private_key)?;

    let mut out = signature.to_bytes();
    out[SIGNATURE_LEN - 1] += 27;
    Ok(out)
}

/// Recovers the signer of a `personal_sign` signature. `v` may be 0/1 or
/// 27/28.
pub fn recover_personal_message(message: &[u8], signature: &[u8]) -> Result<Address, EthError> {
    let signature = RecoverableSignature::from_bytes(signature)?;
    let hash = hash_personal_message(message);
    let public = secp256k1::recover_public_key(&hash, &signature)?;
    Address::from_public_key(&public)
}
