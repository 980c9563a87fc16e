//! Function selector and event topic calculation
//!
//! The selector is the first 4 bytes of keccak256 over the canonical
//! signature; it must match the on-chain dispatcher byte for byte or
//! every call reverts.

use sha3::{Digest, Keccak256};

use super::types::{AbiEvent, AbiFunction};

/// Selector and topic calculator.
pub struct AbiSelector;

impl AbiSelector {
    /// First 4 bytes of keccak256(signature) for a function entry.
    pub fn function_selector(function: &AbiFunction) -> [u8; 4] {
        Self::selector_from_signature(&function.signature())
    }

    /// First 4 bytes of keccak256 over a signature string like
    /// `transfer(address,uint256)`.
    pub fn selector_from_signature(signature: &str) -> [u8; 4] {
        let hash = Self::keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Full 32-byte topic for an event entry.
    pub fn event_topic(event: &AbiEvent) -> [u8; 32] {
        Self::keccak256(event.signature().as_bytes())
    }

    pub fn topic_from_signature(signature: &str) -> [u8; 32] {
        Self::keccak256(signature.as_bytes())
    }

    pub fn keccak256(data: &[u8]) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        let mut output = [0u8; 32];
        output.copy_from_slice(&hasher.finalize());
        output
    }

    /// Selector as a 0x-prefixed hex string.
    pub fn selector_hex(function: &AbiFunction) -> String {
        format!("0x{}", hex::encode(Self::function_selector(function)))
    }
}
