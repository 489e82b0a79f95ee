use hmac::Hmac;
use rand::RngCore;
use rand_core::OsRng;
use sha2::{Sha256, Sha512};

use crate::error::CryptoError;
use crate::secret::SecretBytes;

/// Default salt length for newly created keystores.
pub const SALT_LEN: usize = 32;

/// Pseudo-random function used by PBKDF2, named as in keystore files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prf {
    HmacSha256,
    HmacSha512,
}

impl Prf {
    pub fn from_name(name: &str) -> Result<Self, CryptoError> {
        match name {
            "hmac-sha256" => Ok(Prf::HmacSha256),
            "hmac-sha512" => Ok(Prf::HmacSha512),
            other => Err(CryptoError::UnsupportedAlgorithm(format!("prf {other}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Prf::HmacSha256 => "hmac-sha256",
            Prf::HmacSha512 => "hmac-sha512",
        }
    }
}

/// Derives `dklen` bytes with scrypt.
///
/// `n` is the CPU/memory cost and must be a power of two greater than one.
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    n: u64,
    r: u32,
    p: u32,
    dklen: usize,
) -> Result<SecretBytes, CryptoError> {
    if n < 2 || !n.is_power_of_two() {
        return Err(CryptoError::KdfFailed(format!(
            "scrypt n must be a power of two > 1, got {n}"
        )));
    }
    check_dklen(dklen)?;

    let log_n = n.trailing_zeros() as u8;
    // The params length only feeds the PHC string API; output size is the
    // buffer length.
    let params = scrypt::Params::new(log_n, r, p, dklen.clamp(10, 64))
        .map_err(|e| CryptoError::KdfFailed(format!("invalid scrypt params: {e}")))?;

    let mut output = vec![0u8; dklen];
    scrypt::scrypt(password, salt, &params, &mut output)
        .map_err(|e| CryptoError::KdfFailed(format!("scrypt failed: {e}")))?;

    Ok(SecretBytes::new(output))
}

/// Derives `dklen` bytes with PBKDF2 using the given HMAC variant.
pub fn pbkdf2(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    dklen: usize,
    prf: Prf,
) -> Result<SecretBytes, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::KdfFailed("pbkdf2 iterations must be > 0".into()));
    }
    check_dklen(dklen)?;

    let mut output = vec![0u8; dklen];
    let result = match prf {
        Prf::HmacSha256 => pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut output),
        Prf::HmacSha512 => pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, iterations, &mut output),
    };
    result.map_err(|e| CryptoError::KdfFailed(format!("pbkdf2 failed: {e}")))?;

    Ok(SecretBytes::new(output))
}

/// Generates a cryptographically secure random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn check_dklen(dklen: usize) -> Result<(), CryptoError> {
    // Keystores split the key into an AES half and a MAC half.
    if dklen < 32 {
        return Err(CryptoError::KdfFailed(format!(
            "dklen must be at least 32, got {dklen}"
        )));
    }
    Ok(())
}
