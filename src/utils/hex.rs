//! 0x-prefixed hex helpers
//!
//! The node speaks two hex dialects: data (even-length, zero-padded) and
//! quantities (minimal, no leading zeros). Both are 0x-prefixed on the
//! wire; the prefix is optional on input.

use hex::FromHexError;

/// Encode bytes as 0x-prefixed data hex.
pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode data hex, 0x prefix optional. Surrounding whitespace is
/// tolerated since bytecode files often end with a newline.
pub fn decode_bytes(s: &str) -> Result<Vec<u8>, FromHexError> {
    let s = s.trim();
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

/// Encode a quantity as minimal 0x-prefixed hex (`0x0` for zero).
pub fn encode_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

/// Decode a quantity into a u64.
pub fn decode_quantity(s: &str) -> Result<u64, std::num::ParseIntError> {
    let s = s.trim();
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16)
}
