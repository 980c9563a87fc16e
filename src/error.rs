//! Unified error type
//!
//! Every failure surfaces to the caller as a typed `ClientError`; nothing
//! is swallowed or retried internally. Codec, document, transport, and
//! node-side errors keep their own types and are summed here, so callers
//! can still match on the precise failure domain.

use crate::abi::{AbiDocError, DecodingError, EncodingError, TypeParseError};
use crate::deploy::registry::RegistryError;
use crate::rpc::transport::{RpcError, TransportError};

/// Any error the client can produce.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// A type string in the ABI document could not be parsed.
    #[error(transparent)]
    TypeParse(#[from] TypeParseError),

    /// The ABI document itself is malformed or unsupported.
    #[error(transparent)]
    AbiDoc(#[from] AbiDocError),

    /// An argument did not match its declared parameter type.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Return data from the node could not be decoded.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// The request never produced a usable JSON-RPC response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The node answered, and the answer was an error.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// No receipt showed up within the polling bound.
    #[error("no receipt for transaction {tx_hash} within {timeout_ms} ms")]
    DeploymentTimeout { tx_hash: String, timeout_ms: u64 },

    /// The ABI document has no function entry with this name.
    #[error("function `{0}` not found in contract ABI")]
    FunctionNotFound(String),

    /// A call was attempted before the proxy was given an address.
    #[error("contract has no attached address; deploy it or attach one")]
    MissingAddress,

    /// The deployment receipt carried no contract address.
    #[error("transaction {0} was mined but its receipt has no contract address")]
    MissingContractAddress(String),

    /// An address string was not 20 bytes of hex.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    /// A hex input (bytecode, call data) could not be decoded.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Registry or artifact persistence failed. Kept apart from RPC and
    /// codec failures; the chain state may already hold the deployment.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result alias used across the crate.
pub type ClientResult<T> = Result<T, ClientError>;
