//! Contract ABI JSON documents.

use serde::{Deserialize, Serialize};

use crate::abi::encode::encode;
use crate::abi::event::{DecodedParam, Event, EventParam};
use crate::abi::function::{Function, Param};
use crate::abi::types::{apply_array_suffix, AbiType};
use crate::abi::value::AbiValue;
use crate::error::EthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

/// The constructor entry of an ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub inputs: Vec<Param>,
    pub payable: bool,
}

/// A parsed contract ABI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractAbi {
    pub functions: Vec<Function>,
    pub events: Vec<Event>,
    pub constructor: Option<Constructor>,
    pub has_fallback: bool,
    pub has_receive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    state_mutability: Option<StateMutability>,
    #[serde(default)]
    constant: bool,
    #[serde(default)]
    payable: bool,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    components: Vec<RawParam>,
}

fn default_entry_type() -> String {
    "function".to_string()
}

impl ContractAbi {
    /// Parses the standard JSON array of ABI entries.
    pub fn from_json(json: &str) -> Result<Self, EthError> {
        let entries: Vec<RawEntry> = serde_json::from_str(json)
            .map_err(|e| EthError::Decoding(format!("invalid abi json: {e}")))?;

        let mut abi = ContractAbi::default();
        for entry in entries {
            match entry.kind.as_str() {
                "function" => {
                    let state_mutability = entry.mutability();
                    abi.functions.push(Function {
                        name: entry.name,
                        inputs: params(&entry.inputs)?,
                        outputs: params(&entry.outputs)?,
                        state_mutability,
                    });
                }
                "constructor" => {
                    abi.constructor = Some(Constructor {
                        payable: entry.mutability() == StateMutability::Payable,
                        inputs: params(&entry.inputs)?,
                    });
                }
                "event" => {
                    let inputs = entry
                        .inputs
                        .iter()
                        .map(|raw| {
                            Ok(EventParam {
                                name: raw.name.clone(),
                                kind: param_type(raw)?,
                                indexed: raw.indexed,
                            })
                        })
                        .collect::<Result<Vec<_>, EthError>>()?;
                    abi.events.push(Event {
                        name: entry.name,
                        inputs,
                        anonymous: entry.anonymous,
                    });
                }
                "fallback" => abi.has_fallback = true,
                "receive" => abi.has_receive = true,
                // Custom errors carry no callable behaviour here.
                "error" => {}
                other => {
                    return Err(EthError::Decoding(format!("unknown abi entry type {other}")))
                }
            }
        }
        Ok(abi)
    }

    /// The first function with this name.
    pub fn function(&self, name: &str) -> Result<&Function, EthError> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| EthError::AbiItemNotFound(format!("function {name}")))
    }

    /// All overloads with this name.
    pub fn functions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Function> + 'a {
        self.functions.iter().filter(move |f| f.name == name)
    }

    /// The function with this signature; aliases and whitespace are
    /// normalized first.
    pub fn function_by_signature(&self, signature: &str) -> Result<&Function, EthError> {
        let canonical = Function::parse(signature)?.signature();
        self.functions
            .iter()
            .find(|f| f.signature() == canonical)
            .ok_or_else(|| EthError::AbiItemNotFound(format!("function {canonical}")))
    }

    pub fn function_by_selector(&self, selector: [u8; 4]) -> Option<&Function> {
        self.functions.iter().find(|f| f.selector() == selector)
    }

    /// Finds the function a piece of calldata targets and decodes its
    /// arguments.
    pub fn decode_calldata(&self, calldata: &[u8]) -> Result<(&Function, Vec<AbiValue>), EthError> {
        let selector: [u8; 4] = calldata
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| EthError::Decoding("calldata shorter than a selector".into()))?;
        let function = self.function_by_selector(selector).ok_or_else(|| {
            EthError::AbiItemNotFound(format!("selector 0x{}", hex::encode(selector)))
        })?;
        let args = function.decode_input(calldata)?;
        Ok((function, args))
    }

    /// The first event with this name.
    pub fn event(&self, name: &str) -> Result<&Event, EthError> {
        self.events
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| EthError::AbiItemNotFound(format!("event {name}")))
    }

    /// Deployment data: `bytecode || encode(constructor inputs, args)`.
    ///
    /// Without a constructor entry only empty `args` are accepted.
    pub fn encode_constructor(&self, bytecode: &[u8], args: &[AbiValue]) -> Result<Vec<u8>, EthError> {
        let types: Vec<AbiType> = match &self.constructor {
            Some(constructor) => constructor.inputs.iter().map(|p| p.kind.clone()).collect(),
            None => Vec::new(),
        };
        let encoded = encode(&types, args)?;

        let mut data = Vec::with_capacity(bytecode.len() + encoded.len());
        data.extend_from_slice(bytecode);
        data.extend_from_slice(&encoded);
        Ok(data)
    }

    /// Matches a log against the ABI's events and decodes it.
    ///
    /// Named events match on `topic0`; anonymous events are tried by shape
    /// when no named event matches.
    pub fn parse_log(&self, topics: &[[u8; 32]], data: &[u8]) -> Result<(&Event, Vec<DecodedParam>), EthError> {
        if let Some(topic0) = topics.first() {
            if let Some(event) = self
                .events
                .iter()
                .find(|e| !e.anonymous && e.topic() == *topic0)
            {
                return Ok((event, event.decode_log(topics, data)?));
            }
        }

        self.events
            .iter()
            .filter(|e| e.anonymous)
            .find_map(|e| e.decode_log(topics, data).ok().map(|decoded| (e, decoded)))
            .ok_or_else(|| EthError::AbiItemNotFound("no event matches log".into()))
    }
}

impl RawEntry {
    fn mutability(&self) -> StateMutability {
        match self.state_mutability {
            Some(m) => m,
            None if self.payable => StateMutability::Payable,
            None if self.constant => StateMutability::View,
            None => StateMutability::NonPayable,
        }
    }
}

fn params(raw: &[RawParam]) -> Result<Vec<Param>, EthError> {
    raw.iter()
        .map(|p| Ok(Param::new(p.name.clone(), param_type(p)?)))
        .collect()
}

/// Resolves a JSON parameter type, building tuples from `components`.
fn param_type(raw: &RawParam) -> Result<AbiType, EthError> {
    match raw.kind.strip_prefix("tuple") {
        Some(suffix) => {
            let fields = raw
                .components
                .iter()
                .map(param_type)
                .collect::<Result<Vec<_>, _>>()?;
            if fields.is_empty() {
                return Err(EthError::InvalidAbiType(format!(
                    "{}: tuple has no components",
                    raw.name
                )));
            }
            apply_array_suffix(AbiType::Tuple(fields), suffix)
        }
        None => AbiType::parse(&raw.kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::event::EventValue;
    use crate::address::Address;
    use alloy_primitives::U256;

    const ERC20_ABI: &str = r#"[
        {"type":"constructor","inputs":[{"name":"supply","type":"uint256"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
        {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"balance","type":"uint256"}],"constant":true},
        {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"deposit","inputs":[],"outputs":[],"payable":true},
        {"type":"function","name":"submit","inputs":[{"name":"orders","type":"tuple[]","components":[{"name":"maker","type":"address"},{"name":"amounts","type":"uint256[2]"}]}],"outputs":[]},
        {"type":"event","name":"Transfer","anonymous":false,"inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}]},
        {"type":"fallback","stateMutability":"payable"},
        {"type":"receive","stateMutability":"payable"}
    ]"#;

    fn abi() -> ContractAbi {
        ContractAbi::from_json(ERC20_ABI).unwrap()
    }

    #[test]
    fn parses_all_entry_kinds() {
        let abi = abi();
        assert_eq!(abi.functions.len(), 5);
        assert_eq!(abi.events.len(), 1);
        assert!(abi.constructor.is_some());
        assert!(abi.has_fallback);
        assert!(abi.has_receive);
    }

    #[test]
    fn legacy_mutability_flags() {
        let abi = abi();
        assert_eq!(abi.function("balanceOf").unwrap().state_mutability, StateMutability::View);
        assert_eq!(abi.function("deposit").unwrap().state_mutability, StateMutability::Payable);
        assert_eq!(abi.function("transfer").unwrap().state_mutability, StateMutability::NonPayable);
    }

    #[test]
    fn tuple_components_resolve() {
        let abi = abi();
        let submit = abi.function("submit").unwrap();
        assert_eq!(submit.signature(), "submit((address,uint256[2])[])");
    }

    #[test]
    fn lookup_by_signature_normalizes() {
        let abi = abi();
        let f = abi.function_by_signature("transfer(address, uint)").unwrap();
        assert_eq!(f.name, "transfer");
        assert!(matches!(
            abi.function_by_signature("transfer(address)"),
            Err(EthError::AbiItemNotFound(_))
        ));
    }

    #[test]
    fn missing_function_is_not_found() {
        assert!(matches!(abi().function("mint"), Err(EthError::AbiItemNotFound(_))));
    }

    #[test]
    fn decode_calldata_finds_function() {
        let abi = abi();
        let transfer = abi.function("transfer").unwrap();
        let to = Address::Normal([0x33; 20]);
        let data = transfer.encode_call(&[to.into(), 9u64.into()]).unwrap();

        let (found, args) = abi.decode_calldata(&data).unwrap();
        assert_eq!(found.name, "transfer");
        assert_eq!(args, vec![AbiValue::Address(to), AbiValue::from(9u64)]);

        assert!(abi.decode_calldata(&[0, 0, 0, 0]).is_err());
    }

    #[test]
    fn constructor_appends_arguments() {
        let abi = abi();
        let bytecode = [0x60, 0x80, 0x60, 0x40];
        let data = abi.encode_constructor(&bytecode, &[1000u64.into()]).unwrap();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], &bytecode);
        assert_eq!(&data[34..], &[0x03, 0xe8]);

        assert!(abi.encode_constructor(&bytecode, &[]).is_err());
    }

    #[test]
    fn named_return_value() {
        let abi = abi();
        let balance_of = abi.function("balanceOf").unwrap();
        let data = encode(&[AbiType::Uint(256)], &[AbiValue::from(77u64)]).unwrap();
        let named = balance_of.decode_output_named(&data).unwrap();
        assert_eq!(named["balance"], AbiValue::Uint(U256::from(77u64)));
    }

    #[test]
    fn empty_name_return() {
        let abi = abi();
        let name = abi.function("name").unwrap();
        assert_eq!(name.decode_output(&[]).unwrap(), vec![AbiValue::String(String::new())]);
    }

    #[test]
    fn parse_log_matches_topic0() {
        let abi = abi();
        let event = abi.event("Transfer").unwrap();
        let data = encode(&[AbiType::Uint(256)], &[AbiValue::from(5u64)]).unwrap();
        let topics = [event.topic(), [0u8; 32], [0u8; 32]];

        let (matched, decoded) = abi.parse_log(&topics, &data).unwrap();
        assert_eq!(matched.name, "Transfer");
        assert_eq!(decoded[2].value, EventValue::Value(AbiValue::from(5u64)));

        assert!(abi.parse_log(&[[9u8; 32]], &data).is_err());
    }

    #[test]
    fn invalid_json_is_decoding_error() {
        assert!(matches!(ContractAbi::from_json("{"), Err(EthError::Decoding(_))));
        assert!(ContractAbi::from_json(r#"[{"type":"function","name":"f","inputs":[{"name":"x","type":"uint7"}]}]"#).is_err());
    }
}
