//! JSON-RPC 2.0 transport
//!
//! One HTTP POST per call, correlated by a monotonically increasing
//! request id. Node-side errors (`error` member in the response) and
//! transport-level failures (connection, timeout, bad status, malformed
//! envelope) are kept apart so callers can tell a revert from a dead node.
//! Nothing is retried here: `eth_sendTransaction` is not idempotent, so
//! retrying is the caller's decision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};
use crate::utils::logging;

/// A JSON-RPC request sender. The proxy and the eth namespace are written
/// against this seam so tests can swap in a scripted node.
pub trait Transport: Send + Sync {
    /// Perform one JSON-RPC call and return its `result` member.
    fn request(&self, method: &str, params: Value) -> ClientResult<Value>;
}

/// The node rejected the request (revert, bad params, unknown method).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("node returned error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// The request never produced a usable JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    InvalidResponse(String),

    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: String },
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// Blocking HTTP JSON-RPC transport.
pub struct HttpTransport {
    url: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Build a transport for the given endpoint URL.
    pub fn new(url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .user_agent("ethproxy/0.1")
            .build()
            .map_err(|e| TransportError::Http(format!("failed to build client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

impl Transport for HttpTransport {
    fn request(&self, method: &str, params: Value) -> ClientResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        logging::debug("rpc", "request")
            .field("id", id)
            .field("method", method)
            .log();

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(Self::classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: Value = response
            .json()
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        // Correlate before looking at the payload; an answer to some other
        // request must not be mistaken for ours.
        match parsed.get("id").and_then(Value::as_u64) {
            Some(got) if got == id => {}
            other => {
                return Err(TransportError::IdMismatch {
                    expected: id,
                    got: other
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                }
                .into());
            }
        }

        if let Some(raw) = parsed.get("error").filter(|v| !v.is_null()) {
            let error: RpcError = serde_json::from_value(raw.clone())
                .map_err(|e| TransportError::InvalidResponse(format!("error member: {}", e)))?;
            logging::debug("rpc", "node error")
                .field("id", id)
                .field("code", error.code)
                .log();
            return Err(ClientError::Rpc(error));
        }

        // `result: null` is a valid result; only a response with neither
        // member is malformed.
        parsed
            .get("result")
            .cloned()
            .ok_or_else(|| TransportError::InvalidResponse("missing result".to_string()).into())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_shape() {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_blockNumber",
            params: serde_json::json!([]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "eth_blockNumber");
        assert!(json["params"].as_array().unwrap().is_empty());
    }

    #[test]
    fn response_error_parsing() {
        let parsed: Value = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"revert","data":"0x"}}"#,
        )
        .unwrap();
        let error: RpcError = serde_json::from_value(parsed["error"].clone()).unwrap();
        assert_eq!(error.code, -32000);
        assert_eq!(error.message, "revert");
        assert!(parsed.get("result").is_none());
    }

    #[test]
    fn ids_increment_monotonically() {
        let transport = HttpTransport::new("http://localhost:8545").unwrap();
        let a = transport.next_id.fetch_add(1, Ordering::SeqCst);
        let b = transport.next_id.fetch_add(1, Ordering::SeqCst);
        assert!(b > a);
    }
}
