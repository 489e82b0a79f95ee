//! Ethereum client core.
//!
//! This crate provides:
//! - The [`Address`](address::Address) type with EIP-55 checksums
//! - Contract ABI types, encoding/decoding, functions, events and ABI JSON
//! - Legacy / EIP-155 transactions: RLP codec, signing and sender recovery
//! - EIP-191 personal message signing
//! - Chain ids and JSON-RPC request payloads
//! - Hex, padding and unit conversion helpers

pub mod abi;
pub mod address;
pub mod chain;
pub mod error;
pub mod message;
pub mod rlp;
pub mod rpc;
pub mod transaction;
pub mod utils;

pub use address::Address;
pub use alloy_primitives::{I256, U256};
pub use chain::ChainId;
pub use error::EthError;
pub use transaction::{SignedTransaction, SigningMode, Transaction};
