use alloy_primitives::{I256, U256};

use crate::abi::types::AbiType;
use crate::address::Address;
use crate::error::EthError;

/// A value that can be ABI-encoded; mirrors [`AbiType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Address(Address),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    FixedArray(Vec<AbiValue>),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Checks that this value has the shape of `ty`, including integer width
    /// and fixed lengths.
    pub fn type_check(&self, ty: &AbiType) -> Result<(), EthError> {
        match (ty, self) {
            (AbiType::Uint(bits), AbiValue::Uint(v)) => {
                if !uint_fits(v, *bits) {
                    return Err(EthError::Encoding(format!("value {v} overflows {ty}")));
                }
            }
            (AbiType::Int(bits), AbiValue::Int(v)) => {
                if !int_fits(v, *bits) {
                    return Err(EthError::Encoding(format!("value {v} overflows {ty}")));
                }
            }
            (AbiType::Address, AbiValue::Address(address)) => {
                if address.is_contract_deployment() {
                    return Err(EthError::Encoding(
                        "contract deployment is not an encodable address".into(),
                    ));
                }
            }
            (AbiType::Bool, AbiValue::Bool(_))
            | (AbiType::Bytes, AbiValue::Bytes(_))
            | (AbiType::String, AbiValue::String(_)) => {}
            (AbiType::FixedBytes(size), AbiValue::FixedBytes(bytes)) => {
                if bytes.len() != *size {
                    return Err(EthError::Encoding(format!(
                        "{ty} expects {size} bytes, got {}",
                        bytes.len()
                    )));
                }
            }
            (AbiType::FixedArray(elem, size), AbiValue::FixedArray(items)) => {
                if items.len() != *size {
                    return Err(EthError::Encoding(format!(
                        "{ty} expects {size} elements, got {}",
                        items.len()
                    )));
                }
                items.iter().try_for_each(|item| item.type_check(elem))?;
            }
            (AbiType::Array(elem), AbiValue::Array(items)) => {
                items.iter().try_for_each(|item| item.type_check(elem))?;
            }
            (AbiType::Tuple(fields), AbiValue::Tuple(items)) => {
                if items.len() != fields.len() {
                    return Err(EthError::Encoding(format!(
                        "{ty} expects {} fields, got {}",
                        fields.len(),
                        items.len()
                    )));
                }
                fields
                    .iter()
                    .zip(items)
                    .try_for_each(|(field, item)| item.type_check(field))?;
            }
            _ => {
                return Err(EthError::Encoding(format!(
                    "expected {ty}, got {}",
                    self.kind_name()
                )))
            }
        }
        Ok(())
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            AbiValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Contents of `bytes` or `bytesN`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(b) | AbiValue::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of an array, fixed array or tuple.
    pub fn as_slice(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::FixedArray(items) | AbiValue::Array(items) | AbiValue::Tuple(items) => {
                Some(items)
            }
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::FixedArray(_) => "fixed array",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }
}

pub(crate) fn uint_fits(value: &U256, bits: usize) -> bool {
    value.bit_len() <= bits
}

/// A signed value fits in `bits` when every bit above `bits - 1` is a copy
/// of the sign bit.
pub(crate) fn int_fits(value: &I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let high = value.into_raw() >> (bits - 1);
    high == U256::ZERO || high == U256::MAX >> (bits - 1)
}

impl From<U256> for AbiValue {
    fn from(v: U256) -> Self {
        AbiValue::Uint(v)
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        AbiValue::Uint(U256::from(v))
    }
}

impl From<I256> for AbiValue {
    fn from(v: I256) -> Self {
        AbiValue::Int(v)
    }
}

impl From<Address> for AbiValue {
    fn from(a: Address) -> Self {
        AbiValue::Address(a)
    }
}

impl From<bool> for AbiValue {
    fn from(b: bool) -> Self {
        AbiValue::Bool(b)
    }
}

impl From<&str> for AbiValue {
    fn from(s: &str) -> Self {
        AbiValue::String(s.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(s: String) -> Self {
        AbiValue::String(s)
    }
}
