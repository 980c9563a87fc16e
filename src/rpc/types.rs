//! Wire types for the eth_* RPC surface
//!
//! Field names and hex conventions must match the node's schema exactly:
//! `camelCase` keys, 0x-prefixed minimal hex for quantities, 0x-prefixed
//! data hex for byte blobs. Absent optional fields are omitted, not null.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::hex as hexutil;

/// Transaction parameter object for `eth_call` and `eth_sendTransaction`.
///
/// A contract-creation transaction leaves `to` unset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(rename = "gasPrice", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Caller-facing transaction options, converted into request fields.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    pub from: Option<String>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    pub value: Option<u128>,
}

impl TxOptions {
    /// Fold these options into a request.
    pub fn apply(&self, mut request: TransactionRequest) -> TransactionRequest {
        if let Some(from) = &self.from {
            request.from = Some(from.clone());
        }
        if let Some(gas) = self.gas {
            request.gas = Some(hexutil::encode_quantity(gas as u128));
        }
        if let Some(gas_price) = self.gas_price {
            request.gas_price = Some(hexutil::encode_quantity(gas_price));
        }
        if let Some(value) = self.value {
            request.value = Some(hexutil::encode_quantity(value));
        }
        request
    }
}

/// Receipt of a mined transaction, as returned by
/// `eth_getTransactionReceipt`. Quantity fields stay in wire form; use the
/// accessors for numeric views.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<String>,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Whether the node marked the transaction successful. Pre-Byzantium
    /// receipts carry no status field and count as successful.
    pub fn succeeded(&self) -> bool {
        match &self.status {
            Some(status) => hexutil::decode_quantity(status).map(|s| s == 1).unwrap_or(false),
            None => true,
        }
    }

    pub fn block_number_u64(&self) -> Option<u64> {
        self.block_number
            .as_deref()
            .and_then(|s| hexutil::decode_quantity(s).ok())
    }
}

/// Bounds for receipt polling: how often to ask and for how long.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(60),
        }
    }
}
