//! Head/tail ABI decoding, the inverse of [`encode`](crate::abi::encode).
//!
//! Offsets and lengths come from untrusted input, so every one is bounds
//! checked against the buffer before it is followed.

use alloy_primitives::{I256, U256};

use crate::abi::types::AbiType;
use crate::abi::value::{int_fits, uint_fits, AbiValue};
use crate::abi::WORD;
use crate::address::Address;
use crate::error::EthError;

/// Decodes `data` as a sequence of `types`.
pub fn decode(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, EthError> {
    let head_len = types
        .iter()
        .map(AbiType::head_size)
        .fold(0, usize::saturating_add);
    if data.len() < head_len {
        return Err(EthError::Decoding(format!(
            "data too short: need at least {head_len} bytes, got {}",
            data.len()
        )));
    }
    let types: Vec<&AbiType> = types.iter().collect();
    decode_sequence(&types, data)
}

/// Decodes a single value stored in place at the start of `data`; used for
/// indexed event topics.
pub(crate) fn decode_word(ty: &AbiType, word: &[u8]) -> Result<AbiValue, EthError> {
    decode_value(ty, word)
}

/// `data` starts at the sequence base that offsets are relative to.
fn decode_sequence(types: &[&AbiType], data: &[u8]) -> Result<Vec<AbiValue>, EthError> {
    let mut values = Vec::with_capacity(types.len());
    let mut cursor = 0;

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(data, cursor)?;
            if offset > data.len() {
                return Err(EthError::Decoding(format!(
                    "offset {offset} for {ty} points past end of {} bytes",
                    data.len()
                )));
            }
            values.push(decode_value(ty, &data[offset..])?);
            cursor += WORD;
        } else {
            let end = cursor.saturating_add(ty.head_size());
            if end > data.len() {
                return Err(EthError::Decoding(format!(
                    "{ty} at {cursor} runs past end of {} bytes",
                    data.len()
                )));
            }
            values.push(decode_value(ty, &data[cursor..])?);
            cursor = end;
        }
    }

    Ok(values)
}

fn decode_value(ty: &AbiType, data: &[u8]) -> Result<AbiValue, EthError> {
    let value = match ty {
        AbiType::Uint(bits) => {
            let v = U256::from_be_bytes(read_word(data, 0)?);
            if !uint_fits(&v, *bits) {
                return Err(EthError::Decoding(format!("value {v} overflows {ty}")));
            }
            AbiValue::Uint(v)
        }
        AbiType::Int(bits) => {
            let v = I256::from_raw(U256::from_be_bytes(read_word(data, 0)?));
            if !int_fits(&v, *bits) {
                return Err(EthError::Decoding(format!("value {v} overflows {ty}")));
            }
            AbiValue::Int(v)
        }
        AbiType::Address => {
            let word = read_word(data, 0)?;
            if word[..WORD - 20].iter().any(|&b| b != 0) {
                return Err(EthError::Decoding("address has dirty high bytes".into()));
            }
            AbiValue::Address(Address::from_slice(&word[WORD - 20..])?)
        }
        AbiType::Bool => match read_usize(data, 0)? {
            0 => AbiValue::Bool(false),
            1 => AbiValue::Bool(true),
            other => {
                return Err(EthError::Decoding(format!("invalid bool value {other}")))
            }
        },
        AbiType::FixedBytes(size) => {
            let word = read_word(data, 0)?;
            if word[*size..].iter().any(|&b| b != 0) {
                return Err(EthError::Decoding(format!("{ty} has dirty padding bytes")));
            }
            AbiValue::FixedBytes(word[..*size].to_vec())
        }
        AbiType::Bytes => AbiValue::Bytes(read_length_prefixed(data, ty)?.to_vec()),
        AbiType::String => {
            let bytes = read_length_prefixed(data, ty)?;
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|e| EthError::Decoding(format!("string is not utf-8: {e}")))?;
            AbiValue::String(s)
        }
        AbiType::FixedArray(elem, size) => {
            check_element_room(ty, *size, elem, data)?;
            let types = vec![elem.as_ref(); *size];
            AbiValue::FixedArray(decode_sequence(&types, data)?)
        }
        AbiType::Array(elem) => {
            let len = read_usize(data, 0)?;
            let body = &data[WORD..];
            check_element_room(ty, len, elem, body)?;
            let types = vec![elem.as_ref(); len];
            AbiValue::Array(decode_sequence(&types, body)?)
        }
        AbiType::Tuple(fields) => {
            let types: Vec<&AbiType> = fields.iter().collect();
            AbiValue::Tuple(decode_sequence(&types, data)?)
        }
    };
    Ok(value)
}

/// Each element needs at least one word of head, so a count that cannot fit
/// is rejected before anything is allocated for it.
fn check_element_room(
    ty: &AbiType,
    count: usize,
    elem: &AbiType,
    data: &[u8],
) -> Result<(), EthError> {
    let slot = elem.head_size().max(WORD);
    let min_size = count.checked_mul(slot).unwrap_or(usize::MAX);
    if min_size > data.len() {
        return Err(EthError::Decoding(format!(
            "{ty} declares {count} elements but only {} bytes follow",
            data.len()
        )));
    }
    Ok(())
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; WORD], EthError> {
    data.get(at..at + WORD)
        .and_then(|w| w.try_into().ok())
        .ok_or_else(|| {
            EthError::Decoding(format!(
                "need 32 bytes at {at}, only {} available",
                data.len().saturating_sub(at)
            ))
        })
}

/// Reads a word that must fit in a `usize` (offsets, lengths).
fn read_usize(data: &[u8], at: usize) -> Result<usize, EthError> {
    let word = read_word(data, at)?;
    if word[..WORD - 8].iter().any(|&b| b != 0) {
        return Err(EthError::Decoding(format!(
            "word at {at} is too large for an offset or length"
        )));
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(be))
        .map_err(|_| EthError::Decoding(format!("word at {at} does not fit in usize")))
}

fn read_length_prefixed<'a>(data: &'a [u8], ty: &AbiType) -> Result<&'a [u8], EthError> {
    let len = read_usize(data, 0)?;
    let body = &data[WORD..];
    if len > body.len() {
        return Err(EthError::Decoding(format!(
            "{ty} length {len} exceeds {} available bytes",
            body.len()
        )));
    }
    Ok(&body[..len])
}
