use crypto_utils::keccak256;

use crate::abi::decode::{decode, decode_word};
use crate::abi::encode::{encode, encode_in_place};
use crate::abi::function::canonical_signature;
use crate::abi::types::AbiType;
use crate::abi::value::AbiValue;
use crate::error::EthError;

/// An event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    pub name: String,
    pub kind: AbiType,
    pub indexed: bool,
}

/// A contract event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<EventParam>,
    pub anonymous: bool,
}

/// A decoded event argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValue {
    Value(AbiValue),
    /// Indexed reference types are stored as the Keccak-256 of their
    /// encoding; the original value cannot be recovered.
    Hashed([u8; 32]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedParam {
    pub name: String,
    pub value: EventValue,
}

impl Event {
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`.
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, self.inputs.iter().map(|p| &p.kind))
    }

    /// `topic0`: the full Keccak-256 of the signature.
    pub fn topic(&self) -> [u8; 32] {
        keccak256(self.signature().as_bytes())
    }

    /// Decodes a log's topics and data into arguments in declaration order.
    ///
    /// Non-anonymous events must carry their own `topic0`.
    pub fn decode_log(&self, topics: &[[u8; 32]], data: &[u8]) -> Result<Vec<DecodedParam>, EthError> {
        let mut topics = topics.iter();
        if !self.anonymous {
            let topic0 = topics.next().ok_or_else(|| {
                EthError::Decoding(format!("log for {} has no topics", self.name))
            })?;
            if *topic0 != self.topic() {
                return Err(EthError::Decoding(format!(
                    "topic0 0x{} does not match {}",
                    hex::encode(topic0),
                    self.signature()
                )));
            }
        }

        let indexed_count = self.inputs.iter().filter(|p| p.indexed).count();
        if topics.len() != indexed_count {
            return Err(EthError::Decoding(format!(
                "{} expects {indexed_count} indexed topics, got {}",
                self.signature(),
                topics.len()
            )));
        }

        let data_types: Vec<AbiType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let mut data_values = decode(&data_types, data)?.into_iter();

        let mut decoded = Vec::with_capacity(self.inputs.len());
        for param in &self.inputs {
            let value = if param.indexed {
                let topic = topics
                    .next()
                    .ok_or_else(|| EthError::Decoding("missing indexed topic".into()))?;
                if param.kind.is_value_type() {
                    EventValue::Value(decode_word(&param.kind, topic)?)
                } else {
                    EventValue::Hashed(*topic)
                }
            } else {
                let value = data_values
                    .next()
                    .ok_or_else(|| EthError::Decoding("missing data value".into()))?;
                EventValue::Value(value)
            };
            decoded.push(DecodedParam {
                name: param.name.clone(),
                value,
            });
        }

        Ok(decoded)
    }

    /// Builds a topic filter for `eth_getLogs`.
    ///
    /// `values` lines up with the indexed parameters; `None` matches any
    /// value. The first entry is `topic0` unless the event is anonymous.
    pub fn topics(&self, values: &[Option<AbiValue>]) -> Result<Vec<Option<[u8; 32]>>, EthError> {
        let indexed: Vec<&EventParam> = self.inputs.iter().filter(|p| p.indexed).collect();
        if values.len() > indexed.len() {
            return Err(EthError::Encoding(format!(
                "{} has {} indexed parameters, got {} filter values",
                self.signature(),
                indexed.len(),
                values.len()
            )));
        }

        let mut topics = Vec::with_capacity(values.len() + 1);
        if !self.anonymous {
            topics.push(Some(self.topic()));
        }
        for (param, value) in indexed.iter().zip(values) {
            let topic = match value {
                Some(value) => Some(topic_for_value(&param.kind, value)?),
                None => None,
            };
            topics.push(topic);
        }
        Ok(topics)
    }
}

/// Topic word for an indexed argument: value types as their ABI word,
/// strings and bytes as the Keccak-256 of their contents, arrays and tuples
/// as the Keccak-256 of their in-place encoding.
pub fn topic_for_value(kind: &AbiType, value: &AbiValue) -> Result<[u8; 32], EthError> {
    value.type_check(kind)?;
    match value {
        AbiValue::String(s) => Ok(keccak256(s.as_bytes())),
        AbiValue::Bytes(b) => Ok(keccak256(b)),
        _ if kind.is_value_type() => {
            let word = encode(std::slice::from_ref(kind), std::slice::from_ref(value))?;
            word.as_slice()
                .try_into()
                .map_err(|_| EthError::Encoding(format!("{kind} is not a single word")))
        }
        _ => Ok(keccak256(&encode_in_place(kind, value)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use alloy_primitives::U256;

    fn transfer_event() -> Event {
        Event {
            name: "Transfer".into(),
            inputs: vec![
                EventParam { name: "from".into(), kind: AbiType::Address, indexed: true },
                EventParam { name: "to".into(), kind: AbiType::Address, indexed: true },
                EventParam { name: "value".into(), kind: AbiType::Uint(256), indexed: false },
            ],
            anonymous: false,
        }
    }

    fn address_topic(address: &Address) -> [u8; 32] {
        let mut topic = [0u8; 32];
        topic[12..].copy_from_slice(address.as_bytes());
        topic
    }

    #[test]
    fn transfer_topic0() {
        assert_eq!(
            hex::encode(transfer_event().topic()),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn decodes_transfer_log() {
        let event = transfer_event();
        let from: Address = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap();
        let to = Address::Normal([0x11; 20]);
        let data = encode(&[AbiType::Uint(256)], &[AbiValue::from(500u64)]).unwrap();

        let topics = [event.topic(), address_topic(&from), address_topic(&to)];
        let decoded = event.decode_log(&topics, &data).unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].name, "from");
        assert_eq!(decoded[0].value, EventValue::Value(AbiValue::Address(from)));
        assert_eq!(decoded[1].value, EventValue::Value(AbiValue::Address(to)));
        assert_eq!(decoded[2].value, EventValue::Value(AbiValue::Uint(U256::from(500u64))));
    }

    #[test]
    fn wrong_topic0_is_rejected() {
        let event = transfer_event();
        let topics = [[0u8; 32], [0u8; 32], [0u8; 32]];
        let data = encode(&[AbiType::Uint(256)], &[AbiValue::from(1u64)]).unwrap();
        assert!(matches!(event.decode_log(&topics, &data), Err(EthError::Decoding(_))));
    }

    #[test]
    fn wrong_topic_count_is_rejected() {
        let event = transfer_event();
        let data = encode(&[AbiType::Uint(256)], &[AbiValue::from(1u64)]).unwrap();
        assert!(event.decode_log(&[event.topic()], &data).is_err());
    }

    #[test]
    fn indexed_string_stays_hashed() {
        let event = Event {
            name: "Named".into(),
            inputs: vec![EventParam { name: "label".into(), kind: AbiType::String, indexed: true }],
            anonymous: true,
        };
        let hash = keccak256(b"alice");
        let decoded = event.decode_log(&[hash], &[]).unwrap();
        assert_eq!(decoded[0].value, EventValue::Hashed(hash));
    }

    #[test]
    fn filter_topics() {
        let event = transfer_event();
        let from = Address::Normal([0x22; 20]);
        let topics = event.topics(&[Some(from.into()), None]).unwrap();
        assert_eq!(topics, vec![Some(event.topic()), Some(address_topic(&from)), None]);

        assert!(event.topics(&[None, None, None]).is_err());
    }

    #[test]
    fn string_topic_is_content_hash() {
        let topic = topic_for_value(&AbiType::String, &AbiValue::from("alice")).unwrap();
        assert_eq!(topic, keccak256(b"alice"));
    }

    fn word(n: u8) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[31] = n;
        w
    }

    #[test]
    fn uint_array_topic_hashes_elements_without_length() {
        let kind = AbiType::parse("uint256[]").unwrap();
        let value = AbiValue::Array(vec![1u64.into(), 2u64.into()]);
        let topic = topic_for_value(&kind, &value).unwrap();
        assert_eq!(topic, keccak256(&[word(1), word(2)].concat()));
        assert!(hex::encode(topic).starts_with("e90b7bce"));
    }

    #[test]
    fn dynamic_tuple_topic_pads_strings_in_place() {
        let kind = AbiType::parse("(uint8,string)").unwrap();
        let value = AbiValue::Tuple(vec![7u64.into(), "ab".into()]);
        let mut expected = word(7).to_vec();
        let mut text = [0u8; 32];
        text[..2].copy_from_slice(b"ab");
        expected.extend_from_slice(&text);
        assert_eq!(topic_for_value(&kind, &value).unwrap(), keccak256(&expected));
    }

    #[test]
    fn tuple_topic_with_missing_field_is_an_error() {
        let kind = AbiType::parse("(uint8,string)").unwrap();
        let value = AbiValue::Tuple(vec![7u64.into()]);
        assert!(topic_for_value(&kind, &value).is_err());
    }
}
