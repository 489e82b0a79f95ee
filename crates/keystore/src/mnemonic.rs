use bip39::{Language, Mnemonic};
use crypto_utils::SecretBytes;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::KeystoreError;

/// Generate a new BIP-39 mnemonic with 12, 15, 18, 21 or 24 words.
pub fn generate_mnemonic(word_count: usize) -> Result<String, KeystoreError> {
    let entropy_len = match word_count {
        12 => 16,
        15 => 20,
        18 => 24,
        21 => 28,
        24 => 32,
        other => {
            return Err(KeystoreError::InvalidMnemonic(format!(
                "Unsupported word count {other}"
            )))
        }
    };

    let mut entropy = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut entropy[..entropy_len]);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..entropy_len])
        .map_err(|e| KeystoreError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    Ok(mnemonic?.to_string())
}

/// Validate a mnemonic phrase
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, phrase).is_ok()
}

/// Derive the 64-byte seed from mnemonic + optional passphrase.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<SecretBytes, KeystoreError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| KeystoreError::InvalidMnemonic(e.to_string()))?;

    let mut seed = mnemonic.to_seed(passphrase);
    let secret = SecretBytes::new(seed.to_vec());
    seed.zeroize();
    Ok(secret)
}
