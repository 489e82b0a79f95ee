//! secp256k1 recoverable signatures over 32-byte prehashed messages.
//!
//! Signing is RFC 6979 deterministic and always produces low-S signatures,
//! so the same `(hash, key)` pair yields byte-identical output everywhere.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Serialized signature length: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LEN: usize = 65;

/// A recoverable ECDSA signature.
///
/// `v` is the normalized recovery id (`0..=3`); chain-specific offsets
/// (27, EIP-155) are applied by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl RecoverableSignature {
    /// Builds a signature, checking `v < 4` and `0 < r, s < n`.
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Result<Self, CryptoError> {
        let sig = Self { r, s, v };
        sig.to_k256()?;
        Ok(sig)
    }

    /// Parses `r || s || v`. A trailing `v` of 27/28 is normalized to 0/1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = match bytes[64] {
            v @ 27..=30 => v - 27,
            v => v,
        };
        Self::new(r, s, v)
    }

    /// Serializes as `r || s || v` with the normalized `v`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    fn to_k256(&self) -> Result<(Signature, RecoveryId), CryptoError> {
        let recovery_id = RecoveryId::from_byte(self.v).ok_or_else(|| {
            CryptoError::InvalidSignature(format!("recovery id {} out of range", self.v))
        })?;

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        // Rejects zero scalars and values >= the curve order.
        let signature = Signature::from_slice(&rs)
            .map_err(|e| CryptoError::InvalidSignature(format!("r/s out of range: {e}")))?;

        Ok((signature, recovery_id))
    }
}

/// Checks that `key` is a usable secp256k1 scalar.
pub fn verify_private_key(key: &[u8]) -> Result<(), CryptoError> {
    if key.len() != 32 {
        return Err(CryptoError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            key.len()
        )));
    }
    SigningKey::from_slice(key)
        .map(|_| ())
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Derives the uncompressed public key (65 bytes, `0x04` prefix).
pub fn private_to_public(private_key: &[u8; 32]) -> Result<[u8; 65], CryptoError> {
    let signing_key = signing_key(private_key)?;
    uncompressed(signing_key.verifying_key())
}

/// Signs a 32-byte prehash and returns the recoverable signature.
pub fn sign_recoverable(
    hash: &[u8; 32],
    private_key: &[u8; 32],
) -> Result<RecoverableSignature, CryptoError> {
    let signing_key = signing_key(private_key)?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(hash)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature.r().to_bytes());
    s.copy_from_slice(&signature.s().to_bytes());

    Ok(RecoverableSignature {
        r,
        s,
        v: recovery_id.to_byte(),
    })
}

/// Recovers the uncompressed public key that produced `signature` over `hash`.
pub fn recover_public_key(
    hash: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<[u8; 65], CryptoError> {
    let (sig, recovery_id) = signature.to_k256()?;
    let verifying_key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| CryptoError::InvalidSignature(format!("recovery failed: {e}")))?;
    uncompressed(&verifying_key)
}

fn signing_key(private_key: &[u8; 32]) -> Result<SigningKey, CryptoError> {
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    signing_key
}

fn uncompressed(verifying_key: &VerifyingKey) -> Result<[u8; 65], CryptoError> {
    verifying_key
        .to_encoded_point(false)
        .as_bytes()
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey("unexpected uncompressed length".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;
    use proptest::prelude::*;

    const TEST_PRIVKEY: [u8; 32] = {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    };

    #[test]
    fn public_key_of_one_is_generator() {
        let public = private_to_public(&TEST_PRIVKEY).unwrap();
        assert_eq!(public[0], 0x04);
        assert_eq!(
            hex::encode(&public[1..33]),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn sign_then_recover_returns_signer() {
        let hash = keccak256(b"some message");
        let sig = sign_recoverable(&hash, &TEST_PRIVKEY).unwrap();
        let recovered = recover_public_key(&hash, &sig).unwrap();
        assert_eq!(recovered, private_to_public(&TEST_PRIVKEY).unwrap());
    }

    #[test]
    fn signing_is_deterministic() {
        let hash = keccak256(b"deterministic");
        let a = sign_recoverable(&hash, &TEST_PRIVKEY).unwrap();
        let b = sign_recoverable(&hash, &TEST_PRIVKEY).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn signature_is_low_s() {
        // n / 2
        let half_order =
            hex::decode("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0")
                .unwrap();
        for i in 0u8..16 {
            let hash = keccak256(&[i]);
            let sig = sign_recoverable(&hash, &TEST_PRIVKEY).unwrap();
            assert!(sig.s.as_slice() <= half_order.as_slice());
            assert!(sig.v < 2);
        }
    }

    #[test]
    fn sign_with_zero_key_fails() {
        let hash = [0x11u8; 32];
        let result = sign_recoverable(&hash, &[0u8; 32]);
        assert!(matches!(result, Err(CryptoError::InvalidPrivateKey(_))));
    }

    #[test]
    fn recovery_id_out_of_range_rejected() {
        let hash = keccak256(b"x");
        let mut sig = sign_recoverable(&hash, &TEST_PRIVKEY).unwrap();
        sig.v = 4;
        assert!(matches!(
            recover_public_key(&hash, &sig),
            Err(CryptoError::InvalidSignature(_))
        ));
    }

    #[test]
    fn zero_r_rejected() {
        let result = RecoverableSignature::new([0u8; 32], [1u8; 32], 0);
        assert!(matches!(result, Err(CryptoError::InvalidSignature(_))));
    }

    #[test]
    fn from_bytes_normalizes_27() {
        let hash = keccak256(b"y");
        let sig = sign_recoverable(&hash, &TEST_PRIVKEY).unwrap();
        let mut bytes = sig.to_bytes();
        bytes[64] += 27;
        let parsed = RecoverableSignature::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        assert!(RecoverableSignature::from_bytes(&[0u8; 64]).is_err());
    }

    #[test]
    fn verify_private_key_checks_length() {
        assert!(verify_private_key(&[1u8; 33]).is_err());
        assert!(verify_private_key(&TEST_PRIVKEY).is_ok());
    }

    proptest! {
        #[test]
        fn recover_matches_public_key(key in any::<[u8; 32]>(), msg in any::<[u8; 32]>()) {
            prop_assume!(verify_private_key(&key).is_ok());
            let sig = sign_recoverable(&msg, &key).unwrap();
            let recovered = recover_public_key(&msg, &sig).unwrap();
            prop_assert_eq!(recovered, private_to_public(&key).unwrap());
        }
    }
}
