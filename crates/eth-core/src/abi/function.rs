use std::collections::BTreeMap;

use crypto_utils::keccak256;

use crate::abi::contract::StateMutability;
use crate::abi::decode::decode;
use crate::abi::encode::encode_function_call;
use crate::abi::types::{split_top_level, AbiType};
use crate::abi::value::AbiValue;
use crate::error::EthError;

/// A named function or event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: AbiType,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: AbiType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
}

impl Function {
    /// Parses a textual signature such as `transfer(address,uint256)`.
    ///
    /// Whitespace is ignored and type aliases are expanded; the result has
    /// unnamed inputs and no outputs.
    pub fn parse(signature: &str) -> Result<Self, EthError> {
        let compact: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        let open = compact
            .find('(')
            .ok_or_else(|| EthError::InvalidAbiType(format!("missing '(' in {signature}")))?;
        let name = &compact[..open];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(EthError::InvalidAbiType(format!(
                "invalid function name in {signature}"
            )));
        }

        let args = compact[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| EthError::InvalidAbiType(format!("missing ')' in {signature}")))?;
        let inputs = if args.is_empty() {
            Vec::new()
        } else {
            split_top_level(args)?
                .into_iter()
                .map(|ty| AbiType::parse(ty).map(|kind| Param::new("", kind)))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            name: name.to_string(),
            inputs,
            outputs: Vec::new(),
            state_mutability: StateMutability::NonPayable,
        })
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, self.inputs.iter().map(|p| &p.kind))
    }

    /// First four bytes of the Keccak-256 of the canonical signature.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<AbiType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Builds calldata: selector followed by the encoded arguments.
    pub fn encode_call(&self, args: &[AbiValue]) -> Result<Vec<u8>, EthError> {
        encode_function_call(self.selector(), &self.input_types(), args)
    }

    /// Decodes calldata produced by [`encode_call`](Self::encode_call),
    /// checking the selector first.
    pub fn decode_input(&self, calldata: &[u8]) -> Result<Vec<AbiValue>, EthError> {
        if calldata.len() < 4 {
            return Err(EthError::Decoding(format!(
                "calldata of {} bytes has no selector",
                calldata.len()
            )));
        }
        let selector = self.selector();
        if calldata[..4] != selector {
            return Err(EthError::Decoding(format!(
                "selector 0x{} does not match {} (0x{})",
                hex::encode(&calldata[..4]),
                self.signature(),
                hex::encode(selector)
            )));
        }
        decode(&self.input_types(), &calldata[4..])
    }

    /// Decodes return data.
    ///
    /// A call to code that returns nothing yields zero bytes; when the
    /// function has a single dynamic output that decodes to the type's empty
    /// value instead of an error.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<AbiValue>, EthError> {
        if data.is_empty() {
            if let [only] = self.outputs.as_slice() {
                if only.kind.is_dynamic() {
                    return Ok(vec![only.kind.empty_value()]);
                }
            }
        }
        decode(&self.output_types(), data)
    }

    /// Decodes return data keyed by position (`"0"`, `"1"`, ...) and, for
    /// named outputs, also by name.
    pub fn decode_output_named(&self, data: &[u8]) -> Result<BTreeMap<String, AbiValue>, EthError> {
        let values = self.decode_output(data)?;
        let mut out = BTreeMap::new();
        for (i, (param, value)) in self.outputs.iter().zip(values).enumerate() {
            if !param.name.is_empty() {
                out.insert(param.name.clone(), value.clone());
            }
            out.insert(i.to_string(), value);
        }
        Ok(out)
    }
}

/// Selector of a textual function signature.
pub fn selector(signature: &str) -> Result<[u8; 4], EthError> {
    Ok(Function::parse(signature)?.selector())
}

pub(crate) fn canonical_signature<'a>(
    name: &str,
    types: impl Iterator<Item = &'a AbiType>,
) -> String {
    let args: Vec<String> = types.map(ToString::to_string).collect();
    format!("{name}({})", args.join(","))
}
