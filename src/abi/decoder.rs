//! ABI return-data decoder
//!
//! Walks the head section word by word; dynamic types dereference their
//! offset word into the tail, recursively for nested structures. Every
//! read is bounds-checked so malformed or truncated node responses fail
//! with a typed error instead of reading out of range.

use super::types::{AbiEvent, AbiFunction, AbiType, AbiValue, DecodingError, U256};
use super::word;

/// ABI decoder.
pub struct AbiDecoder;

impl AbiDecoder {
    /// Decode a return-data buffer against an output type list.
    pub fn decode(data: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, DecodingError> {
        let (values, _) = Self::decode_block(data, 0, types)?;
        Ok(values)
    }

    /// Decode a function's return data against its declared outputs.
    pub fn decode_function_result(
        function: &AbiFunction,
        data: &[u8],
    ) -> Result<Vec<AbiValue>, DecodingError> {
        Self::decode(data, &function.output_types())
    }

    /// Decode one block (argument list, tuple, or array elements) rooted at
    /// `base`. Dynamic offsets inside the block are relative to `base`.
    /// Returns the values and the head cursor's final position.
    fn decode_block(
        data: &[u8],
        base: usize,
        types: &[AbiType],
    ) -> Result<(Vec<AbiValue>, usize), DecodingError> {
        let mut values = Vec::with_capacity(types.len());
        let mut cursor = base;

        for abi_type in types {
            if abi_type.is_dynamic() {
                let offset_word = Self::word(data, cursor)?;
                let offset = Self::word_as_offset(offset_word, data.len())?;
                let target = base
                    .checked_add(offset)
                    .filter(|&t| t <= data.len())
                    .ok_or(DecodingError::Truncated {
                        offset: base,
                        needed: offset,
                    })?;
                let (value, _) = Self::decode_value(data, abi_type, target)?;
                values.push(value);
                cursor += word::WORD;
            } else {
                let (value, next) = Self::decode_value(data, abi_type, cursor)?;
                values.push(value);
                cursor = next;
            }
        }

        Ok((values, cursor))
    }

    /// Decode a single value of `abi_type` at `offset`. Returns the value
    /// and the offset just past its static footprint.
    pub fn decode_value(
        data: &[u8],
        abi_type: &AbiType,
        offset: usize,
    ) -> Result<(AbiValue, usize), DecodingError> {
        match abi_type {
            AbiType::Uint(bits) => {
                let value = word::decode_uint(Self::word(data, offset)?, *bits)?;
                Ok((AbiValue::Uint(value), offset + word::WORD))
            }
            AbiType::Int(bits) => {
                let value = word::decode_int(Self::word(data, offset)?, *bits)?;
                Ok((AbiValue::Int(value), offset + word::WORD))
            }
            AbiType::Bool => {
                let value = word::decode_bool(Self::word(data, offset)?)?;
                Ok((AbiValue::Bool(value), offset + word::WORD))
            }
            AbiType::Address => {
                let value = word::decode_address(Self::word(data, offset)?)?;
                Ok((AbiValue::Address(value), offset + word::WORD))
            }
            AbiType::FixedBytes(n) => {
                let value = word::decode_fixed_bytes(Self::word(data, offset)?, *n)?;
                Ok((AbiValue::FixedBytes(value), offset + word::WORD))
            }
            AbiType::Bytes => {
                let (bytes, next) = Self::decode_dynamic_bytes(data, offset)?;
                Ok((AbiValue::Bytes(bytes), next))
            }
            AbiType::String => {
                let (bytes, next) = Self::decode_dynamic_bytes(data, offset)?;
                let s = String::from_utf8(bytes).map_err(|_| DecodingError::InvalidUtf8)?;
                Ok((AbiValue::String(s), next))
            }
            AbiType::Array(inner, None) => {
                let len = Self::word_as_offset(Self::word(data, offset)?, data.len())?;
                // Each element needs at least one word; a length claiming
                // more than the buffer could hold is malformed.
                if len > data.len() / word::WORD {
                    return Err(DecodingError::Truncated {
                        offset,
                        needed: len * word::WORD,
                    });
                }
                let types = vec![(**inner).clone(); len];
                let (values, next) = Self::decode_block(data, offset + word::WORD, &types)?;
                Ok((AbiValue::Array(values), next))
            }
            AbiType::Array(inner, Some(len)) => {
                let types = vec![(**inner).clone(); *len];
                let (values, next) = Self::decode_block(data, offset, &types)?;
                Ok((AbiValue::Array(values), next))
            }
            AbiType::Tuple(types) => {
                let (values, next) = Self::decode_block(data, offset, types)?;
                Ok((AbiValue::Tuple(values), next))
            }
        }
    }

    /// Decode a log entry: indexed parameters from the topics, the rest
    /// from the data section. Indexed dynamic values arrive as their
    /// 32-byte hash and are surfaced as `FixedBytes`.
    pub fn decode_event(
        event: &AbiEvent,
        topics: &[Vec<u8>],
        data: &[u8],
    ) -> Result<Vec<(String, AbiValue)>, DecodingError> {
        let mut decoded = Vec::with_capacity(event.inputs.len());
        // Topic 0 is the event signature unless the event is anonymous.
        let mut topic_idx = usize::from(!event.anonymous);
        let mut data_params = Vec::new();

        for param in &event.inputs {
            if param.indexed {
                let topic = topics.get(topic_idx).ok_or(DecodingError::Truncated {
                    offset: topic_idx,
                    needed: 1,
                })?;
                topic_idx += 1;

                if param.param_type.is_dynamic() {
                    decoded.push((param.name.clone(), AbiValue::FixedBytes(topic.clone())));
                } else {
                    let (value, _) = Self::decode_value(topic, &param.param_type, 0)?;
                    decoded.push((param.name.clone(), value));
                }
            } else {
                data_params.push((param.name.clone(), param.param_type.clone()));
            }
        }

        if !data_params.is_empty() {
            let types: Vec<AbiType> = data_params.iter().map(|(_, t)| t.clone()).collect();
            let values = Self::decode(data, &types)?;
            for ((name, _), value) in data_params.into_iter().zip(values) {
                decoded.push((name, value));
            }
        }

        Ok(decoded)
    }

    /// Length word followed by that many content bytes; the padding up to
    /// the next word boundary must be zero.
    fn decode_dynamic_bytes(
        data: &[u8],
        offset: usize,
    ) -> Result<(Vec<u8>, usize), DecodingError> {
        let len = Self::word_as_offset(Self::word(data, offset)?, data.len())?;
        let content_start = offset + word::WORD;
        let content_end = content_start
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or(DecodingError::Truncated {
                offset: content_start,
                needed: len,
            })?;

        let padded_end = content_start + word::padded_len(len);
        if padded_end > data.len() {
            return Err(DecodingError::Truncated {
                offset: content_end,
                needed: padded_end - data.len(),
            });
        }
        if data[content_end..padded_end].iter().any(|&b| b != 0) {
            return Err(DecodingError::NonZeroPadding("bytes"));
        }

        Ok((data[content_start..content_end].to_vec(), padded_end))
    }

    /// Read one 32-byte word at `offset`.
    fn word(data: &[u8], offset: usize) -> Result<&[u8; word::WORD], DecodingError> {
        let end = offset
            .checked_add(word::WORD)
            .filter(|&end| end <= data.len())
            .ok_or(DecodingError::Truncated {
                offset,
                needed: word::WORD,
            })?;
        Ok(data[offset..end].try_into().expect("slice is 32 bytes"))
    }

    /// Interpret a word as a byte offset or length. Anything that cannot
    /// possibly fit in the buffer is malformed.
    fn word_as_offset(word: &[u8; word::WORD], buffer_len: usize) -> Result<usize, DecodingError> {
        let value = U256::from_be_bytes(word);
        if value.bit_len() > 63 || value.as_u64() as usize > buffer_len {
            return Err(DecodingError::Truncated {
                offset: buffer_len,
                needed: word::WORD,
            });
        }
        Ok(value.as_u64() as usize)
    }
}
