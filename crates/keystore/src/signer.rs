//! Signing with keys held by a [`KeystoreManager`].
//!
//! The private key only lives for the duration of one call and is zeroized
//! on drop. Every signature is checked by recovering the signer.

use crypto_utils::secp256k1::SIGNATURE_LEN;
use eth_core::message;
use eth_core::{Address, SignedTransaction, SigningMode, Transaction};

use crate::error::KeystoreError;
use crate::manager::KeystoreManager;

/// Signs `tx` as `from`, unlocking its key with `password`.
pub fn sign_transaction(
    manager: &KeystoreManager,
    tx: &Transaction,
    from: &Address,
    password: &str,
    mode: SigningMode,
) -> Result<SignedTransaction, KeystoreError> {
    let signed = {
        let key = manager.private_key(password, from)?;
        tx.sign(key.as_bytes(), mode)?
    };

    let sender = signed.recover_sender()?;
    if sender != *from {
        return Err(KeystoreError::SigningFailed(format!(
            "recovered {sender}, expected {from}"
        )));
    }
    Ok(signed)
}

/// Signs an EIP-191 personal message as `from`. Returns `r || s || v` with
/// `v` of 27 or 28.
pub fn sign_personal_message(
    manager: &KeystoreManager,
    msg: &[u8],
    from: &Address,
    password: &str,
) -> Result<[u8; SIGNATURE_LEN], KeystoreError> {
    let signature = {
        let key = manager.private_key(password, from)?;
        message::sign_personal_message(msg, key.as_bytes())?
    };

    let signer = message::recover_personal_message(msg, &signature)?;
    if signer != *from {
        return Err(KeystoreError::SigningFailed(format!(
            "recovered {signer}, expected {from}"
        )));
    }
    Ok(signature)
}
