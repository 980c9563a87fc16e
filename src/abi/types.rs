//! ABI type model for Solidity/EVM contracts
//!
//! Parses parameter type strings (`uint256`, `address`, `uint256[2][]`,
//! `(uint256,bool)`) into a typed model and carries the runtime values
//! that the encoder and decoder operate on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Solidity parameter type.
///
/// Integer widths are carried explicitly: `Uint(bits)`/`Int(bits)` with
/// `bits` a multiple of 8 in `[8, 256]`, and `FixedBytes(n)` with
/// `n` in `[1, 32]`. Arrays carry `Some(len)` for `T[len]` and `None`
/// for `T[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Uint(usize),
    Int(usize),
    Bool,
    Address,
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<AbiType>, Option<usize>),
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Check if the type is dynamic (encoded as an offset into the tail).
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String => true,
            AbiType::Array(_, None) => true,
            AbiType::Array(inner, Some(_)) => inner.is_dynamic(),
            AbiType::Tuple(components) => components.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Size this type occupies in the head section.
    ///
    /// Dynamic types always take one offset word. Static fixed arrays and
    /// tuples are inlined, so their head size is the sum of their parts.
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::Array(inner, Some(len)) if !self.is_dynamic() => inner.head_size() * len,
            AbiType::Tuple(components) if !self.is_dynamic() => {
                components.iter().map(|t| t.head_size()).sum()
            }
            _ => 32,
        }
    }

    /// Parse a type from its ABI string representation.
    pub fn parse(s: &str) -> Result<Self, TypeParseError> {
        let s = s.trim();

        // Array suffixes bind outermost-last: uint256[2][] is a dynamic
        // array of fixed arrays of two uints.
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(AbiType::Array(Box::new(Self::parse(inner)?), None));
        }
        if s.ends_with(']') {
            let open = s
                .rfind('[')
                .ok_or_else(|| TypeParseError::new(s, "unbalanced `]`"))?;
            let len: usize = s[open + 1..s.len() - 1]
                .parse()
                .map_err(|_| TypeParseError::new(s, "bad array length"))?;
            let inner = Self::parse(&s[..open])?;
            return Ok(AbiType::Array(Box::new(inner), Some(len)));
        }

        if s.starts_with('(') && s.ends_with(')') {
            let inner = &s[1..s.len() - 1];
            if inner.trim().is_empty() {
                return Ok(AbiType::Tuple(vec![]));
            }
            return Ok(AbiType::Tuple(Self::parse_tuple_components(inner)?));
        }

        match s {
            "address" => return Ok(AbiType::Address),
            "bool" => return Ok(AbiType::Bool),
            "bytes" => return Ok(AbiType::Bytes),
            "string" => return Ok(AbiType::String),
            "uint" => return Ok(AbiType::Uint(256)),
            "int" => return Ok(AbiType::Int(256)),
            _ => {}
        }

        if let Some(size) = s.strip_prefix("bytes") {
            let n: usize = size
                .parse()
                .map_err(|_| TypeParseError::new(s, "bad bytes size"))?;
            if n == 0 || n > 32 {
                return Err(TypeParseError::new(s, "bytes size must be in 1..=32"));
            }
            return Ok(AbiType::FixedBytes(n));
        }
        if let Some(bits) = s.strip_prefix("uint") {
            return Ok(AbiType::Uint(Self::parse_bits(s, bits)?));
        }
        if let Some(bits) = s.strip_prefix("int") {
            return Ok(AbiType::Int(Self::parse_bits(s, bits)?));
        }

        Err(TypeParseError::new(s, "unknown type"))
    }

    fn parse_bits(full: &str, bits: &str) -> Result<usize, TypeParseError> {
        let bits: usize = bits
            .parse()
            .map_err(|_| TypeParseError::new(full, "bad integer width"))?;
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(TypeParseError::new(
                full,
                "integer width must be a multiple of 8 in 8..=256",
            ));
        }
        Ok(bits)
    }

    /// Split a tuple body on top-level commas, respecting nesting.
    fn parse_tuple_components(s: &str) -> Result<Vec<AbiType>, TypeParseError> {
        let mut components = Vec::new();
        let mut current = String::new();
        let mut depth = 0i32;

        for c in s.chars() {
            match c {
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(TypeParseError::new(s, "unbalanced parentheses"));
                    }
                    current.push(c);
                }
                ',' if depth == 0 => {
                    components.push(Self::parse(current.trim())?);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        if depth != 0 {
            return Err(TypeParseError::new(s, "unbalanced parentheses"));
        }
        if !current.trim().is_empty() {
            components.push(Self::parse(current.trim())?);
        }
        Ok(components)
    }

    /// Canonical type string, as used in signature hashing.
    pub fn canonical(&self) -> String {
        match self {
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::Int(bits) => format!("int{}", bits),
            AbiType::Bool => "bool".to_string(),
            AbiType::Address => "address".to_string(),
            AbiType::FixedBytes(n) => format!("bytes{}", n),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::Array(inner, None) => format!("{}[]", inner.canonical()),
            AbiType::Array(inner, Some(len)) => format!("{}[{}]", inner.canonical(), len),
            AbiType::Tuple(components) => {
                let inner = components
                    .iter()
                    .map(|t| t.canonical())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({})", inner)
            }
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl std::str::FromStr for AbiType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Runtime representation of an ABI value.
#[derive(Debug, Clone, PartialEq)]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address([u8; 20]),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Shorthand for a small unsigned integer value.
    pub fn uint(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }

    /// Shorthand for a small signed integer value.
    pub fn int(value: i64) -> Self {
        AbiValue::Int(I256::from(value))
    }

    /// Parse a 20-byte address from a hex string (0x prefix optional).
    pub fn address_from_hex(s: &str) -> Result<Self, TypeParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|_| TypeParseError::new(s, "address is not valid hex"))?;
        if bytes.len() != 20 {
            return Err(TypeParseError::new(s, "address must be 20 bytes"));
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(AbiValue::Address(addr))
    }

    /// Parse a byte string from hex (0x prefix optional).
    pub fn bytes_from_hex(s: &str) -> Result<Self, TypeParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| TypeParseError::new(s, "invalid hex"))?;
        Ok(AbiValue::Bytes(bytes))
    }

    /// Short tag for error messages. Integer widths are unknowable from the
    /// value alone, so this names only the value's shape.
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Bool(_) => "bool",
            AbiValue::Address(_) => "address",
            AbiValue::FixedBytes(_) => "bytesN",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }
}

/// 256-bit unsigned integer, four little-endian u64 limbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U256(pub [u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0, 0, 0, 0]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);
    pub const MAX: U256 = U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX]);

    pub fn from(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn from_u128(value: u128) -> Self {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }

    /// Big-endian bytes, at most 32; shorter input is left-padded with zero.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let take = bytes.len().min(32);
        let mut padded = [0u8; 32];
        padded[32 - take..].copy_from_slice(&bytes[bytes.len() - take..]);

        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let offset = (3 - i) * 8;
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&padded[offset..offset + 8]);
            *limb = u64::from_be_bytes(chunk);
        }
        U256(limbs)
    }

    /// 32-byte big-endian representation.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, limb) in self.0.iter().enumerate() {
            let offset = (3 - i) * 8;
            bytes[offset..offset + 8].copy_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    /// Parse from a hex string without 0x prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeParseError> {
        let padded;
        let even = if s.len() % 2 == 1 {
            padded = format!("0{}", s);
            padded.as_str()
        } else {
            s
        };
        let bytes = hex::decode(even).map_err(|_| TypeParseError::new(s, "invalid hex"))?;
        if bytes.len() > 32 {
            return Err(TypeParseError::new(s, "value wider than 256 bits"));
        }
        Ok(Self::from_be_bytes(&bytes))
    }

    /// Parse from a decimal string.
    pub fn from_dec(s: &str) -> Result<Self, TypeParseError> {
        if s.is_empty() {
            return Err(TypeParseError::new(s, "empty decimal literal"));
        }
        let mut result = U256::ZERO;
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| TypeParseError::new(s, "bad decimal digit"))?;
            result = result
                .checked_mul_u64(10)
                .and_then(|r| r.checked_add(U256::from(digit as u64)))
                .ok_or_else(|| TypeParseError::new(s, "decimal literal overflows 256 bits"))?;
        }
        Ok(result)
    }

    pub fn checked_add(&self, other: U256) -> Option<U256> {
        let mut result = [0u64; 4];
        let mut carry = 0u64;
        for i in 0..4 {
            let (sum1, c1) = self.0[i].overflowing_add(other.0[i]);
            let (sum2, c2) = sum1.overflowing_add(carry);
            result[i] = sum2;
            carry = (c1 as u64) + (c2 as u64);
        }
        if carry != 0 {
            None
        } else {
            Some(U256(result))
        }
    }

    pub fn checked_mul_u64(&self, other: u64) -> Option<U256> {
        let mut result = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let prod = (self.0[i] as u128) * (other as u128) + carry;
            result[i] = prod as u64;
            carry = prod >> 64;
        }
        if carry != 0 {
            None
        } else {
            Some(U256(result))
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    /// Number of significant bits; zero for `U256::ZERO`.
    pub fn bit_len(&self) -> usize {
        for (i, limb) in self.0.iter().enumerate().rev() {
            if *limb != 0 {
                return i * 64 + (64 - limb.leading_zeros() as usize);
            }
        }
        0
    }

    pub fn is_power_of_two(&self) -> bool {
        self.0.iter().map(|l| l.count_ones()).sum::<u32>() == 1
    }

    /// Whether the value is representable as an unsigned integer of the
    /// given bit width.
    pub fn fits_bits(&self, bits: usize) -> bool {
        self.bit_len() <= bits
    }

    /// Low 64 bits; truncates.
    pub fn as_u64(&self) -> u64 {
        self.0[0]
    }

    /// Low 128 bits; truncates.
    pub fn as_u128(&self) -> u128 {
        ((self.0[1] as u128) << 64) | (self.0[0] as u128)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }
}

/// 256-bit signed integer stored as magnitude plus sign.
///
/// Negative zero (`I256(U256::ZERO, true)`) is never produced by the
/// constructors or the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I256(pub U256, pub bool);

impl I256 {
    pub const ZERO: I256 = I256(U256::ZERO, false);

    pub fn from(value: i64) -> Self {
        if value >= 0 {
            I256(U256::from(value as u64), false)
        } else {
            I256(U256::from(value.unsigned_abs()), true)
        }
    }

    pub fn from_i128(value: i128) -> Self {
        if value >= 0 {
            I256(U256::from_u128(value as u128), false)
        } else {
            I256(U256::from_u128(value.unsigned_abs()), true)
        }
    }

    pub fn is_negative(&self) -> bool {
        self.1
    }

    pub fn magnitude(&self) -> U256 {
        self.0
    }

    /// Whether the value is representable as a two's-complement integer of
    /// the given bit width: `-2^(bits-1) <= v <= 2^(bits-1) - 1`.
    pub fn fits_bits(&self, bits: usize) -> bool {
        if !self.1 {
            self.0.fits_bits(bits - 1)
        } else {
            let len = self.0.bit_len();
            len < bits || (len == bits && self.0.is_power_of_two())
        }
    }

    /// 32-byte big-endian two's-complement representation.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        if !self.1 {
            return self.0.to_be_bytes();
        }
        let mut bytes = self.0.to_be_bytes();
        for b in &mut bytes {
            *b = !*b;
        }
        let mut carry = 1u8;
        for b in bytes.iter_mut().rev() {
            let (sum, c) = b.overflowing_add(carry);
            *b = sum;
            carry = c as u8;
            if carry == 0 {
                break;
            }
        }
        bytes
    }

    /// Interpret big-endian bytes as two's complement.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return I256::ZERO;
        }
        if bytes[0] & 0x80 == 0 {
            return I256(U256::from_be_bytes(bytes), false);
        }
        let mut inverted: Vec<u8> = bytes.iter().map(|b| !b).collect();
        let mut carry = 1u8;
        for b in inverted.iter_mut().rev() {
            let (sum, c) = b.overflowing_add(carry);
            *b = sum;
            carry = c as u8;
            if carry == 0 {
                break;
            }
        }
        I256(U256::from_be_bytes(&inverted), true)
    }
}

/// State mutability of a function entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    #[default]
    Nonpayable,
    Payable,
    View,
    Pure,
}

impl StateMutability {
    /// Read-only entries go through `eth_call`; everything else is a
    /// state-changing transaction.
    pub fn is_readonly(&self) -> bool {
        matches!(self, StateMutability::View | StateMutability::Pure)
    }
}

/// Kind of a callable ABI entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionType {
    #[default]
    Function,
    Constructor,
}

/// One named parameter of a function or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiParam {
    pub name: String,
    pub param_type: AbiType,
}

/// A function or constructor entry, parsed once from the ABI document.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
    pub state_mutability: StateMutability,
    pub function_type: FunctionType,
}

impl AbiFunction {
    /// Canonical signature used for selector calculation.
    pub fn signature(&self) -> String {
        let params = self
            .inputs
            .iter()
            .map(|p| p.param_type.canonical())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.name, params)
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.param_type.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<AbiType> {
        self.outputs.iter().map(|p| p.param_type.clone()).collect()
    }
}

/// One event parameter, with its indexed flag.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiEventParam {
    pub name: String,
    pub param_type: AbiType,
    pub indexed: bool,
}

/// An event entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiEvent {
    pub name: String,
    pub inputs: Vec<AbiEventParam>,
    pub anonymous: bool,
}

impl AbiEvent {
    /// Canonical signature used for topic calculation.
    pub fn signature(&self) -> String {
        let params = self
            .inputs
            .iter()
            .map(|p| p.param_type.canonical())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.name, params)
    }
}

/// A type string in the ABI document could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ABI type `{text}`: {reason}")]
pub struct TypeParseError {
    pub text: String,
    pub reason: String,
}

impl TypeParseError {
    pub fn new(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

/// An argument could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("argument {position}: expected {expected}, got {got}")]
    TypeMismatch {
        position: usize,
        expected: String,
        got: String,
    },

    #[error("argument {position}: value does not fit in {bits} bits")]
    IntegerOverflow { position: usize, bits: usize },
}

/// Return data could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    #[error("data ends before {needed} byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("non-zero padding in {0} word")]
    NonZeroPadding(&'static str),

    #[error("boolean word is neither 0 nor 1")]
    InvalidBool,

    #[error("string content is not valid UTF-8")]
    InvalidUtf8,
}
