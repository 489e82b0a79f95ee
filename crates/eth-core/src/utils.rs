//! Hex, padding and integer helpers shared by the codecs.

use alloy_primitives::U256;

use crate::error::EthError;

/// Strips a leading `0x`/`0X`, if present.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decodes hex with an optional `0x` prefix. Odd-length input is treated as
/// having an implicit leading zero nibble.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, EthError> {
    let digits = strip_hex_prefix(s.trim());
    let result = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };
    result.map_err(|e| EthError::Decoding(format!("invalid hex: {e}")))
}

/// Lowercase hex with a `0x` prefix.
pub fn encode_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Left-pads `bytes` with zeros to `len`.
pub fn left_pad(bytes: &[u8], len: usize) -> Result<Vec<u8>, EthError> {
    if bytes.len() > len {
        return Err(EthError::Encoding(format!(
            "{} bytes do not fit in {len}",
            bytes.len()
        )));
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Right-pads `bytes` with zeros to `len`.
pub fn right_pad(bytes: &[u8], len: usize) -> Result<Vec<u8>, EthError> {
    if bytes.len() > len {
        return Err(EthError::Encoding(format!(
            "{} bytes do not fit in {len}",
            bytes.len()
        )));
    }
    let mut out = bytes.to_vec();
    out.resize(len, 0);
    Ok(out)
}

/// Drops leading zero bytes (minimal big-endian form; zero becomes empty).
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Formats a JSON-RPC quantity: minimal hex with `0x`, zero as `0x0`.
pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

/// Parses a JSON-RPC quantity (`0x`-prefixed hex). `0x` alone is zero.
pub fn parse_quantity(s: &str) -> Result<U256, EthError> {
    let digits = strip_hex_prefix(s.trim());
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| EthError::Decoding(format!("invalid quantity {s}: {e}")))
}

/// Parses a decimal amount into its integer base-unit value.
///
/// `parse_units("1.5", 18)` is 1.5 ether in wei. More fractional digits than
/// `decimals` is an error rather than a silent truncation.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, EthError> {
    let amount = amount.trim();
    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(EthError::Encoding("empty amount".into()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(EthError::Encoding(format!("invalid decimal amount {amount}")));
    }
    if fraction.len() > decimals as usize {
        return Err(EthError::Encoding(format!(
            "amount {amount} has more than {decimals} decimals"
        )));
    }

    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals as usize - fraction.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| EthError::Encoding(format!("amount {amount} out of range: {e}")))
}

/// Formats a base-unit value as a decimal amount, dropping trailing
/// fractional zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{digits}", "0".repeat(decimals + 1 - digits.len()))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}
