//! Contract ABI codec
//!
//! Everything needed to go from an ABI document plus runtime arguments to
//! call data, and from raw return data back to typed values:
//! - type model and type-string parsing
//! - strict 32-byte word primitives
//! - head/tail argument encoding and decoding
//! - function selector and event topic calculation
//! - JSON ABI document parsing

pub mod decoder;
pub mod encoder;
pub mod parser;
pub mod selector;
pub mod types;
pub mod word;


pub use decoder::AbiDecoder;
pub use encoder::AbiEncoder;
pub use parser::{AbiDocError, ContractAbi};
pub use selector::AbiSelector;
pub use types::{
    AbiEvent, AbiEventParam, AbiFunction, AbiParam, AbiType, AbiValue, DecodingError,
    EncodingError, FunctionType, StateMutability, TypeParseError, I256, U256,
};
