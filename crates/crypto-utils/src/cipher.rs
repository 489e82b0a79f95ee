use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use aes::Aes128;
use rand::RngCore;
use rand_core::OsRng;

use crate::error::CryptoError;
use crate::secret::SecretBytes;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// AES-128 key size in bytes.
pub const AES128_KEY_LEN: usize = 16;

/// AES block / IV size in bytes.
pub const IV_LEN: usize = 16;

/// Supported AES-128 block modes, named as in keystore files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesMode {
    /// `aes-128-ctr`: big-endian 128-bit counter, IV is the initial counter.
    Ctr,
    /// `aes-128-cbc`: no padding, input must be block aligned.
    Cbc,
}

impl AesMode {
    pub fn from_name(name: &str) -> Result<Self, CryptoError> {
        match name {
            "aes-128-ctr" => Ok(AesMode::Ctr),
            "aes-128-cbc" => Ok(AesMode::Cbc),
            other => Err(CryptoError::UnsupportedAlgorithm(format!("cipher {other}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AesMode::Ctr => "aes-128-ctr",
            AesMode::Cbc => "aes-128-cbc",
        }
    }
}

/// Encrypts `plaintext` with AES-128 in the given mode.
pub fn aes128_encrypt(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    mode: AesMode,
) -> Result<Vec<u8>, CryptoError> {
    check_key_iv(key, iv)?;
    let mut buf = plaintext.to_vec();

    match mode {
        AesMode::Ctr => {
            let mut cipher = Aes128Ctr::new_from_slices(key, iv)
                .map_err(|_| CryptoError::InvalidKeyLength)?;
            cipher.apply_keystream(&mut buf);
        }
        AesMode::Cbc => {
            check_block_aligned(buf.len())?;
            let len = buf.len();
            Aes128CbcEnc::new_from_slices(key, iv)
                .map_err(|_| CryptoError::InvalidKeyLength)?
                .encrypt_padded_mut::<NoPadding>(&mut buf, len)
                .map_err(|_| CryptoError::EncryptionFailed("cbc block encryption".into()))?;
        }
    }

    Ok(buf)
}

/// Decrypts `ciphertext` with AES-128 in the given mode.
///
/// The plaintext is returned as [`SecretBytes`] since it usually holds key
/// material.
pub fn aes128_decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    mode: AesMode,
) -> Result<SecretBytes, CryptoError> {
    check_key_iv(key, iv)?;
    let mut buf = ciphertext.to_vec();

    match mode {
        AesMode::Ctr => {
            let mut cipher = Aes128Ctr::new_from_slices(key, iv)
                .map_err(|_| CryptoError::InvalidKeyLength)?;
            cipher.apply_keystream(&mut buf);
        }
        AesMode::Cbc => {
            check_block_aligned(buf.len())?;
            Aes128CbcDec::new_from_slices(key, iv)
                .map_err(|_| CryptoError::InvalidKeyLength)?
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(|_| CryptoError::DecryptionFailed("cbc block decryption".into()))?;
        }
    }

    Ok(SecretBytes::new(buf))
}

/// Generates a random 16-byte IV.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

fn check_key_iv(key: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
    if key.len() != AES128_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength);
    }
    if iv.len() != IV_LEN {
        return Err(CryptoError::InvalidInput(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

fn check_block_aligned(len: usize) -> Result<(), CryptoError> {
    if len % IV_LEN != 0 {
        return Err(CryptoError::InvalidInput(format!(
            "cbc input must be a multiple of {IV_LEN} bytes, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // NIST SP 800-38A test key.
    const KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const PLAINTEXT: &str = "6bc1bee22e409f96e93d7e117393172a";

    #[test]
    fn ctr_matches_nist_vector() {
        let key = hex::decode(KEY).unwrap();
        let iv = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
        let pt = hex::decode(PLAINTEXT).unwrap();

        let ct = aes128_encrypt(&key, &iv, &pt, AesMode::Ctr).unwrap();
        assert_eq!(hex::encode(&ct), "874d6191b620e3261bef6864990db6ce");

        let back = aes128_decrypt(&key, &iv, &ct, AesMode::Ctr).unwrap();
        assert_eq!(&*back, pt.as_slice());
    }

    #[test]
    fn cbc_matches_nist_vector() {
        let key = hex::decode(KEY).unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let pt = hex::decode(PLAINTEXT).unwrap();

        let ct = aes128_encrypt(&key, &iv, &pt, AesMode::Cbc).unwrap();
        assert_eq!(hex::encode(&ct), "7649abac8119b246cee98e9b12e9197d");

        let back = aes128_decrypt(&key, &iv, &ct, AesMode::Cbc).unwrap();
        assert_eq!(&*back, pt.as_slice());
    }

    #[test]
    fn cbc_rejects_unaligned_input() {
        let key = [0u8; 16];
        let iv = [0u8; 16];
        let result = aes128_encrypt(&key, &iv, &[1u8; 20], AesMode::Cbc);
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
    }

    #[test]
    fn ctr_roundtrip_32_bytes() {
        let key = [7u8; 16];
        let iv = generate_iv();
        let pt = [0x42u8; 32];
        let ct = aes128_encrypt(&key, &iv, &pt, AesMode::Ctr).unwrap();
        assert_ne!(ct.as_slice(), pt.as_slice());
        let back = aes128_decrypt(&key, &iv, &ct, AesMode::Ctr).unwrap();
        assert_eq!(&*back, pt.as_slice());
    }

    #[test]
    fn wrong_key_length_rejected() {
        let result = aes128_encrypt(&[0u8; 32], &[0u8; 16], &[0u8; 16], AesMode::Ctr);
        assert!(matches!(result, Err(CryptoError::InvalidKeyLength)));
    }

    #[test]
    fn wrong_iv_length_rejected() {
        let result = aes128_decrypt(&[0u8; 16], &[0u8; 12], &[0u8; 16], AesMode::Ctr);
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
    }

    #[test]
    fn mode_names_roundtrip() {
        for mode in [AesMode::Ctr, AesMode::Cbc] {
            assert_eq!(AesMode::from_name(mode.name()).unwrap(), mode);
        }
        assert!(matches!(
            AesMode::from_name("aes-256-gcm"),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn generated_ivs_differ() {
        assert_ne!(generate_iv(), generate_iv());
    }
}
