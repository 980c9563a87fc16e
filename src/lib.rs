//! ABI-driven contract client for EVM JSON-RPC nodes
//!
//! Deploy contract bytecode and invoke deployed contracts from nothing but
//! their JSON ABI document; no contract-specific generated code.
//!
//! # Architecture
//!
//! - **abi**: the Contract-ABI binary codec: type model, strict word
//!   primitives, head/tail encoding and decoding, selectors, document
//!   parsing
//! - **rpc**: JSON-RPC 2.0 over blocking HTTP, typed eth_* methods,
//!   bounded receipt polling
//! - **contract**: the dynamic proxy tying codec and transport together
//! - **deploy**: deployment sequencing with a persisted address registry
//! - **error**: one typed error sum for everything
//!
//! The node is trusted to hold unlocked accounts and sign submitted
//! transactions, as a local development node does.
//!
//! # Example
//!
//! ```rust,ignore
//! use ethproxy::{Contract, Eth, TxOptions, PollOptions, AbiValue};
//!
//! let eth = Eth::http("http://127.0.0.1:8545")?;
//! let accounts = eth.accounts()?;
//!
//! let mut storage = Contract::from_json(eth.clone(), &abi_json)?;
//! let options = TxOptions { from: accounts.first().cloned(), gas: Some(300_000), ..Default::default() };
//! storage.deploy(&bytecode_hex, &[], &options, &PollOptions::default())?;
//!
//! storage.send("set", &[AbiValue::uint(2)], &options)?;
//! let value = storage.call("get", &[])?;
//! ```

pub mod abi;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod rpc;
pub mod utils;

pub use abi::{
    AbiDecoder, AbiEncoder, AbiFunction, AbiSelector, AbiType, AbiValue, ContractAbi, I256, U256,
};
pub use contract::{Contract, Invocation};
pub use deploy::{AddressRegistry, ContractArtifact, DeployConfig, DeployedContract, Deployer};
pub use error::{ClientError, ClientResult};
pub use rpc::{
    Eth, HttpTransport, PollOptions, RpcError, TransactionReceipt, TransactionRequest, Transport,
    TransportError, TxOptions,
};
