use std::fmt;
use std::str::FromStr;

use crypto_utils::keccak256;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{EncodedPoint, PublicKey};

use crate::error::EthError;
use crate::utils::strip_hex_prefix;

/// Length of an Ethereum address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// An Ethereum account address.
///
/// `ContractDeployment` is the empty recipient of a contract-creating
/// transaction. It has no bytes and no checksum form; equality compares raw
/// bytes, never the display string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    Normal([u8; ADDRESS_LEN]),
    ContractDeployment,
}

impl Address {
    pub const ZERO: Address = Address::Normal([0u8; ADDRESS_LEN]);

    /// Wraps exactly 20 raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EthError> {
        let raw: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            EthError::InvalidAddress(format!(
                "expected {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Address::Normal(raw))
    }

    /// Derives the address of a secp256k1 public key.
    ///
    /// Accepts the uncompressed (65 bytes, `0x04` prefix) or compressed
    /// (33 bytes) SEC1 encoding. The address is the last 20 bytes of the
    /// Keccak-256 hash of the 64-byte `x || y` point.
    pub fn from_public_key(public_key: &[u8]) -> Result<Self, EthError> {
        let uncompressed = match public_key.len() {
            65 => {
                if public_key[0] != 0x04 {
                    return Err(EthError::InvalidPublicKey(
                        "uncompressed key must start with 0x04".into(),
                    ));
                }
                let mut key = [0u8; 65];
                key.copy_from_slice(public_key);
                key
            }
            33 => decompress(public_key)?,
            other => {
                return Err(EthError::InvalidPublicKey(format!(
                    "expected 33 or 65 bytes, got {other}"
                )))
            }
        };

        let hash = keccak256(&uncompressed[1..]);
        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(&hash[12..]);
        Ok(Address::Normal(raw))
    }

    /// Derives the address controlled by a raw private key.
    pub fn from_private_key(private_key: &[u8; 32]) -> Result<Self, EthError> {
        let public = crypto_utils::secp256k1::private_to_public(private_key)?;
        Self::from_public_key(&public)
    }

    /// Raw address bytes; empty for a contract deployment.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Address::Normal(raw) => raw,
            Address::ContractDeployment => &[],
        }
    }

    pub fn is_contract_deployment(&self) -> bool {
        matches!(self, Address::ContractDeployment)
    }

    /// EIP-55 checksum form (`0x` + 40 mixed-case hex digits).
    ///
    /// A contract deployment renders as the bare `0x`.
    pub fn to_checksum(&self) -> String {
        match self {
            Address::Normal(raw) => format!("0x{}", checksum_hex(raw)),
            Address::ContractDeployment => "0x".to_string(),
        }
    }

    /// Lowercase hex without `0x`, as stored in keystore files.
    pub fn to_lower_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl FromStr for Address {
    type Err = EthError;

    /// Parses 40 hex digits with an optional `0x` prefix.
    ///
    /// All-lowercase and all-uppercase input is accepted as is; mixed case
    /// must carry a valid EIP-55 checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = strip_hex_prefix(s.trim());

        if hex_part.len() != 2 * ADDRESS_LEN {
            return Err(EthError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                hex_part.len()
            )));
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EthError::InvalidAddress(
                "address contains non-hex characters".into(),
            ));
        }

        let bytes = hex::decode(hex_part)
            .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
        let address = Address::from_slice(&bytes)?;

        if is_mixed_case(hex_part) {
            if let Address::Normal(raw) = &address {
                if checksum_hex(raw) != hex_part {
                    return Err(EthError::InvalidAddress(format!(
                        "checksum mismatch for {s}"
                    )));
                }
            }
        }

        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Normal(_) => write!(f, "Address({})", self.to_checksum()),
            Address::ContractDeployment => f.write_str("Address(ContractDeployment)"),
        }
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(raw: [u8; ADDRESS_LEN]) -> Self {
        Address::Normal(raw)
    }
}

/// Validates an Ethereum address string.
///
/// Returns `Ok(false)` when the string is well-formed but its mixed-case
/// checksum is wrong, and an error when it is not an address at all.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(EthError::InvalidAddress(
            "address must start with 0x".into(),
        ));
    }

    match address.parse::<Address>() {
        Ok(_) => Ok(true),
        Err(EthError::InvalidAddress(msg)) if msg.starts_with("checksum mismatch") => Ok(false),
        Err(e) => Err(e),
    }
}

/// Applies EIP-55 checksum casing to an address string of any case.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let lower = address.to_ascii_lowercase();
    Ok(lower.parse::<Address>()?.to_checksum())
}

/// EIP-55: upper-case each hex letter whose nibble in
/// `keccak256(lowercase_hex)` is >= 8.
fn checksum_hex(raw: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(raw);
    let hash = keccak256(lower.as_bytes());

    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

fn is_mixed_case(hex_part: &str) -> bool {
    hex_part.chars().any(|c| c.is_ascii_uppercase())
        && hex_part.chars().any(|c| c.is_ascii_lowercase())
}

fn decompress(compressed: &[u8]) -> Result<[u8; 65], EthError> {
    let encoded = EncodedPoint::from_bytes(compressed).map_err(|e| {
        EthError::InvalidPublicKey(format!("invalid compressed key encoding: {e}"))
    })?;

    let pubkey: Option<PublicKey> = PublicKey::from_encoded_point(&encoded).into();
    let pubkey = pubkey.ok_or_else(|| {
        EthError::InvalidPublicKey("point is not on the secp256k1 curve".into())
    })?;

    let uncompressed = pubkey.to_encoded_point(false);
    uncompressed
        .as_bytes()
        .try_into()
        .map_err(|_| EthError::InvalidPublicKey("unexpected uncompressed length".into()))
}
