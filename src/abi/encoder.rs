//! ABI argument encoder
//!
//! Produces call data per the contract ABI head/tail scheme: static values
//! are encoded in place in the head section, dynamic values leave an offset
//! word behind and append their content to the tail. Nested dynamic
//! structures apply the same scheme recursively, with offsets measured from
//! the start of the enclosing block.

use super::types::{AbiFunction, AbiType, AbiValue, EncodingError};
use super::word;

/// ABI encoder.
pub struct AbiEncoder;

impl AbiEncoder {
    /// Encode an argument list against its parameter types.
    ///
    /// The argument count must match; each argument is validated against its
    /// declared type with the offending top-level position reported on
    /// mismatch.
    pub fn encode(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, EncodingError> {
        if values.len() != types.len() {
            return Err(EncodingError::ArityMismatch {
                expected: types.len(),
                got: values.len(),
            });
        }
        Self::encode_block(values, types, None)
    }

    /// Encode a function call: selector followed by the encoded arguments.
    pub fn encode_call(
        function: &AbiFunction,
        values: &[AbiValue],
    ) -> Result<Vec<u8>, EncodingError> {
        use super::selector::AbiSelector;

        let selector = AbiSelector::function_selector(function);
        let types = function.input_types();
        let params = Self::encode(values, &types)?;

        let mut data = Vec::with_capacity(4 + params.len());
        data.extend_from_slice(&selector);
        data.extend_from_slice(&params);
        Ok(data)
    }

    /// Encode contract-creation data: bytecode followed by the encoded
    /// constructor arguments. No selector is involved. When the ABI has no
    /// constructor entry, the argument list must be empty and the bytecode
    /// is returned as is.
    pub fn encode_constructor(
        bytecode: &[u8],
        constructor: Option<&AbiFunction>,
        values: &[AbiValue],
    ) -> Result<Vec<u8>, EncodingError> {
        let types = match constructor {
            Some(c) => c.input_types(),
            None => Vec::new(),
        };
        if values.len() != types.len() {
            return Err(EncodingError::ArityMismatch {
                expected: types.len(),
                got: values.len(),
            });
        }

        let mut data = bytecode.to_vec();
        if !types.is_empty() {
            data.extend_from_slice(&Self::encode_block(values, &types, None)?);
        }
        Ok(data)
    }

    /// Encode one block of values (function arguments, a tuple, or array
    /// elements) as heads followed by tails.
    ///
    /// `position` is `Some` when this block encodes the inside of one
    /// top-level argument, so nested errors still name the outer position;
    /// `None` makes each element its own position.
    fn encode_block(
        values: &[AbiValue],
        types: &[AbiType],
        position: Option<usize>,
    ) -> Result<Vec<u8>, EncodingError> {
        let head_size: usize = types.iter().map(|t| t.head_size()).sum();

        let mut head = Vec::with_capacity(head_size);
        let mut tail = Vec::new();

        for (i, (value, abi_type)) in values.iter().zip(types.iter()).enumerate() {
            let pos = position.unwrap_or(i);
            if abi_type.is_dynamic() {
                // Offset of this value's content, relative to the start of
                // the block. The tail grows in argument order, so the offset
                // is known the moment the head word is written.
                let offset = head_size + tail.len();
                head.extend_from_slice(&word::uint_word(
                    &super::types::U256::from(offset as u64),
                    256,
                    pos,
                )?);
                tail.extend_from_slice(&Self::encode_value(value, abi_type, pos)?);
            } else {
                head.extend_from_slice(&Self::encode_value(value, abi_type, pos)?);
            }
        }

        head.extend_from_slice(&tail);
        Ok(head)
    }

    /// Encode a single value against its type. `position` is the top-level
    /// argument index used in error reports.
    pub fn encode_value(
        value: &AbiValue,
        abi_type: &AbiType,
        position: usize,
    ) -> Result<Vec<u8>, EncodingError> {
        match (value, abi_type) {
            (AbiValue::Uint(u), AbiType::Uint(bits)) => {
                Ok(word::uint_word(u, *bits, position)?.to_vec())
            }
            (AbiValue::Int(i), AbiType::Int(bits)) => {
                Ok(word::int_word(i, *bits, position)?.to_vec())
            }
            (AbiValue::Bool(b), AbiType::Bool) => Ok(word::bool_word(*b).to_vec()),
            (AbiValue::Address(addr), AbiType::Address) => Ok(word::address_word(addr).to_vec()),
            (AbiValue::FixedBytes(bytes), AbiType::FixedBytes(n)) => {
                Ok(word::fixed_bytes_word(bytes, *n, position)?.to_vec())
            }
            (AbiValue::Bytes(bytes), AbiType::Bytes) => Ok(Self::encode_dynamic_bytes(bytes)),
            (AbiValue::String(s), AbiType::String) => Ok(Self::encode_dynamic_bytes(s.as_bytes())),

            (AbiValue::Array(values), AbiType::Array(inner, None)) => {
                let mut data = Vec::new();
                data.extend_from_slice(
                    &super::types::U256::from(values.len() as u64).to_be_bytes(),
                );
                let types = vec![(**inner).clone(); values.len()];
                data.extend_from_slice(&Self::encode_block(values, &types, Some(position))?);
                Ok(data)
            }
            (AbiValue::Array(values), AbiType::Array(inner, Some(len))) => {
                if values.len() != *len {
                    return Err(EncodingError::TypeMismatch {
                        position,
                        expected: format!("array of length {}", len),
                        got: format!("array of length {}", values.len()),
                    });
                }
                let types = vec![(**inner).clone(); values.len()];
                Self::encode_block(values, &types, Some(position))
            }
            (AbiValue::Tuple(values), AbiType::Tuple(types)) => {
                if values.len() != types.len() {
                    return Err(EncodingError::TypeMismatch {
                        position,
                        expected: format!("tuple of {} elements", types.len()),
                        got: format!("tuple of {} elements", values.len()),
                    });
                }
                Self::encode_block(values, types, Some(position))
            }

            _ => Err(EncodingError::TypeMismatch {
                position,
                expected: abi_type.canonical(),
                got: value.kind().to_string(),
            }),
        }
    }

    /// Length word followed by the content, zero-padded to a word boundary.
    fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
        let padded = word::padded_len(bytes.len());
        let mut data = Vec::with_capacity(word::WORD + padded);
        data.extend_from_slice(&super::types::U256::from(bytes.len() as u64).to_be_bytes());
        data.extend_from_slice(bytes);
        data.resize(word::WORD + padded, 0);
        data
    }
}
