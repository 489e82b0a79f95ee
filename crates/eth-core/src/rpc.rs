//! JSON-RPC request payloads.
//!
//! Only the request side lives here; sending requests and parsing response
//! envelopes belongs to the transport.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::{json, Value};

use crate::address::Address;
use crate::transaction::{SignedTransaction, TransactionParameters};
use crate::utils::encode_hex_prefixed;

/// A method name and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub method: &'static str,
    pub params: Vec<Value>,
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Vec<Value>,
}

/// Hands out request ids. Shared by reference between threads; each request
/// gets a distinct id.
#[derive(Debug)]
pub struct RequestBuilder {
    next_id: AtomicU64,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: AtomicU64::new(first_id),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn request(&self, call: RpcCall) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id(),
            method: call.method,
            params: call.params,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The block a state query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
    Earliest,
    Number(u64),
}

impl BlockTag {
    fn to_value(self) -> Value {
        match self {
            BlockTag::Latest => json!("latest"),
            BlockTag::Pending => json!("pending"),
            BlockTag::Earliest => json!("earliest"),
            BlockTag::Number(n) => json!(format!("0x{n:x}")),
        }
    }
}

/// `eth_getLogs` filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: Option<BlockTag>,
    pub to_block: Option<BlockTag>,
    pub address: Option<Address>,
    /// Positional topics; `None` matches anything.
    pub topics: Vec<Option<[u8; 32]>>,
}

impl LogFilter {
    fn to_value(&self) -> Value {
        let mut filter = serde_json::Map::new();
        if let Some(from) = self.from_block {
            filter.insert("fromBlock".into(), from.to_value());
        }
        if let Some(to) = self.to_block {
            filter.insert("toBlock".into(), to.to_value());
        }
        if let Some(address) = &self.address {
            filter.insert("address".into(), json!(encode_hex_prefixed(address.as_bytes())));
        }
        if !self.topics.is_empty() {
            let topics: Vec<Value> = self
                .topics
                .iter()
                .map(|t| match t {
                    Some(topic) => json!(encode_hex_prefixed(topic)),
                    None => Value::Null,
                })
                .collect();
            filter.insert("topics".into(), Value::Array(topics));
        }
        Value::Object(filter)
    }
}

fn params_value(params: &TransactionParameters) -> Value {
    let mut object = serde_json::Map::new();
    let optional = [
        ("from", &params.from),
        ("to", &params.to),
        ("gas", &params.gas),
        ("gasPrice", &params.gas_price),
        ("value", &params.value),
    ];
    for (key, field) in optional {
        if let Some(v) = field {
            object.insert(key.into(), json!(v));
        }
    }
    object.insert("data".into(), json!(params.data));
    Value::Object(object)
}

pub fn eth_call(params: &TransactionParameters, block: BlockTag) -> RpcCall {
    RpcCall {
        method: "eth_call",
        params: vec![params_value(params), block.to_value()],
    }
}

pub fn eth_estimate_gas(params: &TransactionParameters) -> RpcCall {
    RpcCall {
        method: "eth_estimateGas",
        params: vec![params_value(params)],
    }
}

pub fn eth_send_raw_transaction(tx: &SignedTransaction) -> RpcCall {
    RpcCall {
        method: "eth_sendRawTransaction",
        params: vec![json!(tx.to_raw_hex())],
    }
}

pub fn eth_get_transaction_count(address: &Address, block: BlockTag) -> RpcCall {
    RpcCall {
        method: "eth_getTransactionCount",
        params: vec![json!(encode_hex_prefixed(address.as_bytes())), block.to_value()],
    }
}

pub fn eth_get_balance(address: &Address, block: BlockTag) -> RpcCall {
    RpcCall {
        method: "eth_getBalance",
        params: vec![json!(encode_hex_prefixed(address.as_bytes())), block.to_value()],
    }
}

pub fn eth_gas_price() -> RpcCall {
    RpcCall {
        method: "eth_gasPrice",
        params: Vec::new(),
    }
}

pub fn eth_get_logs(filter: &LogFilter) -> RpcCall {
    RpcCall {
        method: "eth_getLogs",
        params: vec![filter.to_value()],
    }
}
