//! eth_* namespace over a transport handle
//!
//! Thin typed wrappers around the node methods the client consumes, plus
//! the bounded receipt-polling helper. Holds the transport behind an `Arc`
//! so one connection can back many contract proxies.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use serde_json::{json, Value};

use super::transport::{Transport, TransportError};
use super::types::{PollOptions, TransactionReceipt, TransactionRequest};
use crate::abi::U256;
use crate::error::{ClientError, ClientResult};
use crate::utils::hex as hexutil;

/// Handle to a node's eth namespace.
#[derive(Clone)]
pub struct Eth {
    transport: Arc<dyn Transport>,
}

impl Eth {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Connect over HTTP to a JSON-RPC endpoint.
    pub fn http(url: impl Into<String>) -> ClientResult<Self> {
        use super::transport::HttpTransport;
        Ok(Self::new(Arc::new(HttpTransport::new(url)?)))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Accounts the node controls (`eth_accounts`).
    pub fn accounts(&self) -> ClientResult<Vec<String>> {
        let result = self.transport.request("eth_accounts", json!([]))?;
        let accounts = result
            .as_array()
            .ok_or_else(|| invalid("eth_accounts: expected array"))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid("eth_accounts: expected string entries"))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(accounts)
    }

    /// Current block number (`eth_blockNumber`).
    pub fn block_number(&self) -> ClientResult<u64> {
        let result = self.transport.request("eth_blockNumber", json!([]))?;
        quantity(&result, "eth_blockNumber")
    }

    /// Balance of an address at the latest block (`eth_getBalance`).
    pub fn get_balance(&self, address: &str) -> ClientResult<U256> {
        let result = self
            .transport
            .request("eth_getBalance", json!([address, "latest"]))?;
        let s = result
            .as_str()
            .ok_or_else(|| invalid("eth_getBalance: expected hex string"))?;
        U256::from_hex(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| invalid(format!("eth_getBalance: {}", e)))
    }

    /// Chain id (`eth_chainId`).
    pub fn chain_id(&self) -> ClientResult<u64> {
        let result = self.transport.request("eth_chainId", json!([]))?;
        quantity(&result, "eth_chainId")
    }

    /// Network id as a decimal string (`net_version`).
    pub fn net_version(&self) -> ClientResult<String> {
        let result = self.transport.request("net_version", json!([]))?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid("net_version: expected string"))
    }

    /// Execute a read-only call at the latest block (`eth_call`) and
    /// return the raw result bytes.
    pub fn call(&self, request: &TransactionRequest) -> ClientResult<Vec<u8>> {
        let result = self
            .transport
            .request("eth_call", json!([request, "latest"]))?;
        let s = result
            .as_str()
            .ok_or_else(|| invalid("eth_call: expected hex string"))?;
        hexutil::decode_bytes(s).map_err(|e| invalid(format!("eth_call: {}", e)))
    }

    /// Submit a transaction for the node to sign and broadcast
    /// (`eth_sendTransaction`). Returns the transaction hash.
    pub fn send_transaction(&self, request: &TransactionRequest) -> ClientResult<String> {
        let result = self
            .transport
            .request("eth_sendTransaction", json!([request]))?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid("eth_sendTransaction: expected hash string"))
    }

    /// Receipt of a transaction, or `None` while it is unmined
    /// (`eth_getTransactionReceipt`).
    pub fn transaction_receipt(&self, hash: &str) -> ClientResult<Option<TransactionReceipt>> {
        let result = self
            .transport
            .request("eth_getTransactionReceipt", json!([hash]))?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt = serde_json::from_value(result)
            .map_err(|e| invalid(format!("eth_getTransactionReceipt: {}", e)))?;
        Ok(Some(receipt))
    }

    /// Poll for a receipt within the given bounds.
    ///
    /// Asks immediately, then every `interval` until `timeout` has elapsed.
    /// RPC and transport failures abort the wait; only a still-missing
    /// receipt keeps it going.
    pub fn wait_for_receipt(
        &self,
        hash: &str,
        poll: &PollOptions,
    ) -> ClientResult<TransactionReceipt> {
        let deadline = Instant::now() + poll.timeout;
        loop {
            if let Some(receipt) = self.transaction_receipt(hash)? {
                return Ok(receipt);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::DeploymentTimeout {
                    tx_hash: hash.to_string(),
                    timeout_ms: poll.timeout.as_millis() as u64,
                });
            }
            thread::sleep(poll.interval.min(deadline - now));
        }
    }
}

fn invalid(message: impl Into<String>) -> ClientError {
    TransportError::InvalidResponse(message.into()).into()
}

fn quantity(result: &Value, what: &str) -> ClientResult<u64> {
    let s = result
        .as_str()
        .ok_or_else(|| invalid(format!("{}: expected hex quantity", what)))?;
    hexutil::decode_quantity(s).map_err(|e| invalid(format!("{}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::transport::mock::MockTransport;
    use super::*;

    fn eth_with(replies: Vec<ClientResult<Value>>) -> (Eth, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new(replies));
        (Eth::new(mock.clone()), mock)
    }

    #[test]
    fn accounts_and_block_number() {
        let (eth, mock) = eth_with(vec![
            Ok(json!(["0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1"])),
            Ok(json!("0x2a")),
        ]);
        assert_eq!(
            eth.accounts().unwrap(),
            vec!["0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1".to_string()]
        );
        assert_eq!(eth.block_number().unwrap(), 42);

        let calls = mock.recorded();
        assert_eq!(calls[0].0, "eth_accounts");
        assert_eq!(calls[1].0, "eth_blockNumber");
    }

    #[test]
    fn balance_parses_large_quantities() {
        let (eth, _) = eth_with(vec![Ok(json!("0xde0b6b3a7640000"))]); // 1e18
        let balance = eth.get_balance("0x00").unwrap();
        assert_eq!(balance.as_u128(), 1_000_000_000_000_000_000);
    }

    #[test]
    fn call_params_include_block_tag() {
        let (eth, mock) = eth_with(vec![Ok(json!("0x002a"))]);
        let request = TransactionRequest {
            to: Some("0xc0de".to_string()),
            data: Some("0x6d4ce63c".to_string()),
            ..Default::default()
        };
        let bytes = eth.call(&request).unwrap();
        assert_eq!(bytes, vec![0x00, 0x2a]);

        let calls = mock.recorded();
        let params = calls[0].1.as_array().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["to"], "0xc0de");
        assert_eq!(params[1], "latest");
    }

    #[test]
    fn rpc_error_passes_through_untouched() {
        use crate::rpc::transport::RpcError;

        let (eth, _) = eth_with(vec![Err(ClientError::Rpc(RpcError {
            code: -32000,
            message: "revert".to_string(),
        }))]);
        match eth.block_number().unwrap_err() {
            ClientError::Rpc(e) => {
                assert_eq!(e.code, -32000);
                assert_eq!(e.message, "revert");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn wait_for_receipt_polls_until_found() {
        let receipt = json!({
            "transactionHash": "0xhash",
            "blockNumber": "0x1",
            "contractAddress": null,
            "status": "0x1"
        });
        let (eth, mock) = eth_with(vec![Ok(Value::Null), Ok(Value::Null), Ok(receipt)]);
        let poll = PollOptions {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        };
        let receipt = eth.wait_for_receipt("0xhash", &poll).unwrap();
        assert!(receipt.succeeded());
        assert_eq!(mock.recorded().len(), 3);
    }

    #[test]
    fn wait_for_receipt_times_out() {
        // Endless nulls; the bound has to cut the wait.
        let (eth, _) = eth_with(vec![Ok(Value::Null); 64]);
        let poll = PollOptions {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(10),
        };
        match eth.wait_for_receipt("0xdead", &poll).unwrap_err() {
            ClientError::DeploymentTimeout { tx_hash, .. } => assert_eq!(tx_hash, "0xdead"),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
