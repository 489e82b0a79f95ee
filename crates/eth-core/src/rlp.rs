//! The subset of RLP used by legacy transactions: byte strings, minimal
//! big-endian integers and flat lists of those.

use alloy_primitives::U256;
use alloy_rlp::{Encodable, Header};

use crate::error::EthError;
use crate::utils::trim_leading_zeros;

/// Appends the RLP encoding of a byte string.
pub fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    bytes.encode(out);
}

/// Appends the RLP encoding of an integer: minimal big-endian bytes, zero as
/// the empty string.
pub fn encode_uint(value: &U256, out: &mut Vec<u8>) {
    let be = value.to_be_bytes::<32>();
    encode_bytes(trim_leading_zeros(&be), out);
}

/// Wraps already-encoded items into an RLP list.
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_length = items.iter().map(Vec::len).sum();
    let header = Header {
        list: true,
        payload_length,
    };

    let mut out = Vec::with_capacity(header.length() + payload_length);
    header.encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Decodes a list whose items are all byte strings.
///
/// The whole input must be consumed: trailing bytes, nested lists and
/// lengths that run past the end of the input are errors.
pub fn decode_flat_list(data: &[u8]) -> Result<Vec<&[u8]>, EthError> {
    let mut buf = data;
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(EthError::Decoding("expected rlp list".into()));
    }
    if buf.len() < header.payload_length {
        return Err(EthError::Decoding(format!(
            "rlp list declares {} bytes, only {} available",
            header.payload_length,
            buf.len()
        )));
    }
    if buf.len() > header.payload_length {
        return Err(EthError::Decoding(format!(
            "{} trailing bytes after rlp list",
            buf.len() - header.payload_length
        )));
    }

    let mut payload = buf;
    let mut items = Vec::new();
    while !payload.is_empty() {
        let item = Header::decode(&mut payload)?;
        if item.list {
            return Err(EthError::Decoding(format!(
                "item {} is a nested list",
                items.len()
            )));
        }
        if payload.len() < item.payload_length {
            return Err(EthError::Decoding(format!(
                "item {} declares {} bytes, only {} available",
                items.len(),
                item.payload_length,
                payload.len()
            )));
        }
        let (value, rest) = payload.split_at(item.payload_length);
        items.push(value);
        payload = rest;
    }

    Ok(items)
}

/// Interprets an RLP string as an integer, rejecting leading zeros and
/// values wider than 256 bits.
pub fn decode_uint(bytes: &[u8], field: &str) -> Result<U256, EthError> {
    if bytes.first() == Some(&0) {
        return Err(EthError::Decoding(format!(
            "{field}: integer has leading zero bytes"
        )));
    }
    U256::try_from_be_slice(bytes)
        .ok_or_else(|| EthError::Decoding(format!("{field}: integer wider than 256 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_uint(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_uint(&U256::from(value), &mut out);
        out
    }

    #[test]
    fn zero_encodes_as_empty_string() {
        assert_eq!(encoded_uint(0), vec![0x80]);
    }

    #[test]
    fn small_integer_is_single_byte() {
        assert_eq!(encoded_uint(42), vec![42]);
        assert_eq!(encoded_uint(0x7f), vec![0x7f]);
        assert_eq!(encoded_uint(0x80), vec![0x81, 0x80]);
    }

    #[test]
    fn multi_byte_integer_is_minimal() {
        assert_eq!(encoded_uint(1024), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn address_sized_string_prefix() {
        let mut out = Vec::new();
        encode_bytes(&[0xde; 20], &mut out);
        assert_eq!(out[0], 0x94);
        assert_eq!(out.len(), 21);
    }

    #[test]
    fn long_string_uses_length_of_length() {
        let mut out = Vec::new();
        encode_bytes(&[0xaa; 56], &mut out);
        assert_eq!(&out[..2], &[0xb8, 56]);
        assert_eq!(out.len(), 58);
    }

    #[test]
    fn list_threshold_at_55_bytes() {
        let short = encode_list(&[vec![0x80; 55]]);
        assert_eq!(short[0], 0xc0 + 55);

        let long = encode_list(&[vec![0x80; 56]]);
        assert_eq!(&long[..2], &[0xf8, 56]);
    }

    #[test]
    fn cat_dog_list() {
        let mut cat = Vec::new();
        encode_bytes(b"cat", &mut cat);
        let mut dog = Vec::new();
        encode_bytes(b"dog", &mut dog);
        let list = encode_list(&[cat, dog]);
        assert_eq!(hex::encode(&list), "c88363617483646f67");

        let items = decode_flat_list(&list).unwrap();
        assert_eq!(items, vec![&b"cat"[..], &b"dog"[..]]);
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut list = encode_list(&[vec![0x01]]);
        list.push(0x00);
        assert!(matches!(decode_flat_list(&list), Err(EthError::Decoding(_))));
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let list = encode_list(&[vec![0x83, b'c', b'a', b't']]);
        assert!(decode_flat_list(&list[..list.len() - 1]).is_err());
    }

    #[test]
    fn decode_rejects_nested_list() {
        let inner = encode_list(&[vec![0x01]]);
        let outer = encode_list(&[inner]);
        assert!(decode_flat_list(&outer).is_err());
    }

    #[test]
    fn decode_rejects_non_list() {
        assert!(decode_flat_list(&[0x83, b'c', b'a', b't']).is_err());
    }

    #[test]
    fn decode_uint_rejects_leading_zero() {
        assert!(decode_uint(&[0x00, 0x01], "nonce").is_err());
        assert_eq!(decode_uint(&[], "nonce").unwrap(), U256::ZERO);
        assert_eq!(decode_uint(&[0x04, 0x00], "nonce").unwrap(), U256::from(1024u64));
    }

    #[test]
    fn decode_uint_rejects_oversized() {
        let err = decode_uint(&[0x01; 33], "value").unwrap_err();
        assert!(err.to_string().contains("value"));
    }
}
