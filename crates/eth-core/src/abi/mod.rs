//! Contract ABI: the type system, the 32-byte-word codec, functions, events
//! and ABI JSON documents.

pub mod contract;
pub mod decode;
pub mod encode;
pub mod event;
pub mod function;
pub mod types;
pub mod value;

pub use contract::{Constructor, ContractAbi, StateMutability};
pub use decode::decode;
pub use encode::{encode, encode_function_call};
pub use event::{DecodedParam, Event, EventParam, EventValue};
pub use function::{selector, Function, Param};
pub use types::AbiType;
pub use value::AbiValue;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;
