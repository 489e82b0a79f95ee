//! Head/tail ABI encoding.
//!
//! A sequence of values is laid out as a head of fixed-size slots followed
//! by a tail. Static values sit in their head slot; dynamic values put a
//! 32-byte offset (relative to the start of the sequence) in the head and
//! their payload in the tail, in call order.

use crate::abi::types::AbiType;
use crate::abi::value::AbiValue;
use crate::abi::WORD;
use crate::error::EthError;

/// Encodes `values` against `types`.
///
/// Every value is type-checked before any bytes are produced.
pub fn encode(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, EthError> {
    if types.len() != values.len() {
        return Err(EthError::Encoding(format!(
            "expected {} values, got {}",
            types.len(),
            values.len()
        )));
    }
    for (i, (ty, value)) in types.iter().zip(values).enumerate() {
        value
            .type_check(ty)
            .map_err(|e| EthError::Encoding(format!("argument {i}: {e}")))?;
    }

    let items: Vec<_> = types.iter().zip(values).collect();
    encode_sequence(&items)
}

/// Encodes a function call: `selector || encode(types, values)`.
pub fn encode_function_call(
    selector: [u8; 4],
    types: &[AbiType],
    values: &[AbiValue],
) -> Result<Vec<u8>, EthError> {
    let args = encode(types, values)?;
    let mut data = Vec::with_capacity(4 + args.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&args);
    Ok(data)
}

fn encode_sequence(items: &[(&AbiType, &AbiValue)]) -> Result<Vec<u8>, EthError> {
    let head_len: usize = items.iter().map(|(ty, _)| ty.head_size()).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (ty, value) in items {
        if ty.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_value(ty, value)?);
        } else {
            head.extend(encode_value(ty, value)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

/// Encodes one value as it appears in place (static) or in the tail
/// (dynamic).
fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EthError> {
    let encoded = match (ty, value) {
        (AbiType::Uint(_), AbiValue::Uint(v)) => v.to_be_bytes::<WORD>().to_vec(),
        // Two's complement, sign-extended to the full word.
        (AbiType::Int(_), AbiValue::Int(v)) => v.into_raw().to_be_bytes::<WORD>().to_vec(),
        (AbiType::Address, AbiValue::Address(address)) => {
            let mut word = vec![0u8; WORD];
            word[WORD - 20..].copy_from_slice(address.as_bytes());
            word
        }
        (AbiType::Bool, AbiValue::Bool(b)) => usize_word(usize::from(*b)).to_vec(),
        (AbiType::FixedBytes(_), AbiValue::FixedBytes(bytes)) => padded(bytes),
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => length_prefixed(bytes),
        (AbiType::String, AbiValue::String(s)) => length_prefixed(s.as_bytes()),
        (AbiType::FixedArray(elem, _), AbiValue::FixedArray(items)) => {
            let items: Vec<_> = items.iter().map(|item| (elem.as_ref(), item)).collect();
            encode_sequence(&items)?
        }
        (AbiType::Array(elem), AbiValue::Array(items)) => {
            let mut out = usize_word(items.len()).to_vec();
            let items: Vec<_> = items.iter().map(|item| (elem.as_ref(), item)).collect();
            out.extend(encode_sequence(&items)?);
            out
        }
        (AbiType::Tuple(fields), AbiValue::Tuple(items)) => {
            let items: Vec<_> = fields.iter().zip(items).collect();
            encode_sequence(&items)?
        }
        _ => return Err(EthError::Encoding(format!("value does not match {ty}"))),
    };
    Ok(encoded)
}

/// In-place encoding used to hash indexed reference types in event topics:
/// elements padded to whole words and concatenated, with no offsets or
/// length prefixes at any depth.
pub(crate) fn encode_in_place(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EthError> {
    let encoded = match (ty, value) {
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => padded(bytes),
        (AbiType::String, AbiValue::String(s)) => padded(s.as_bytes()),
        (AbiType::FixedArray(_, size), AbiValue::FixedArray(items)) if items.len() != *size => {
            return Err(EthError::Encoding(format!(
                "{ty} expects {size} elements, got {}",
                items.len()
            )));
        }
        (AbiType::Tuple(fields), AbiValue::Tuple(items)) if fields.len() != items.len() => {
            return Err(EthError::Encoding(format!(
                "{ty} expects {} fields, got {}",
                fields.len(),
                items.len()
            )));
        }
        (AbiType::FixedArray(elem, _), AbiValue::FixedArray(items))
        | (AbiType::Array(elem), AbiValue::Array(items)) => {
            let mut out = Vec::new();
            for item in items {
                out.extend(encode_in_place(elem, item)?);
            }
            out
        }
        (AbiType::Tuple(fields), AbiValue::Tuple(items)) => {
            let mut out = Vec::new();
            for (field, item) in fields.iter().zip(items) {
                out.extend(encode_in_place(field, item)?);
            }
            out
        }
        _ => encode_value(ty, value)?,
    };
    Ok(encoded)
}

pub(crate) fn usize_word(n: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

/// Right-pads to a multiple of the word size.
fn padded(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    let rem = out.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
    out
}

fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend(padded(bytes));
    out
}
