//! JSON-RPC client layer
//!
//! - **transport**: the JSON-RPC 2.0 envelope over blocking HTTP
//! - **types**: wire structs for transactions and receipts
//! - **eth**: typed eth_* methods and bounded receipt polling

pub mod eth;
pub mod transport;
pub mod types;

pub use eth::Eth;
pub use transport::{HttpTransport, RpcError, Transport, TransportError};
pub use types::{PollOptions, TransactionReceipt, TransactionRequest, TxOptions};
