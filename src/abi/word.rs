//! 32-byte word primitives
//!
//! Every ABI head slot is one 32-byte big-endian word. These helpers encode
//! and decode single words with strict conformance checks: integer values
//! are range-checked against their declared width, booleans must be exactly
//! 0 or 1, and padding bytes must be zero.

use super::types::{DecodingError, EncodingError, I256, U256};

/// Word size of the ABI encoding.
pub const WORD: usize = 32;

/// Round a byte length up to the next word boundary.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Encode an unsigned integer of the given declared width.
pub fn uint_word(value: &U256, bits: usize, position: usize) -> Result<[u8; WORD], EncodingError> {
    if !value.fits_bits(bits) {
        return Err(EncodingError::IntegerOverflow { position, bits });
    }
    Ok(value.to_be_bytes())
}

/// Encode a signed integer of the given declared width (two's complement).
pub fn int_word(value: &I256, bits: usize, position: usize) -> Result<[u8; WORD], EncodingError> {
    if !value.fits_bits(bits) {
        return Err(EncodingError::IntegerOverflow { position, bits });
    }
    Ok(value.to_be_bytes())
}

/// Encode a boolean as the word 0 or 1.
pub fn bool_word(value: bool) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 1] = value as u8;
    word
}

/// Encode an address in the low 20 bytes of a word.
pub fn address_word(address: &[u8; 20]) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address);
    word
}

/// Encode `bytesN` content, left-aligned and zero-padded.
pub fn fixed_bytes_word(
    bytes: &[u8],
    n: usize,
    position: usize,
) -> Result<[u8; WORD], EncodingError> {
    if bytes.len() != n {
        return Err(EncodingError::TypeMismatch {
            position,
            expected: format!("bytes{}", n),
            got: format!("{} byte(s)", bytes.len()),
        });
    }
    let mut word = [0u8; WORD];
    word[..n].copy_from_slice(bytes);
    Ok(word)
}

/// Decode an unsigned integer, rejecting values wider than the declared
/// width.
pub fn decode_uint(word: &[u8; WORD], bits: usize) -> Result<U256, DecodingError> {
    let value = U256::from_be_bytes(word);
    if !value.fits_bits(bits) {
        return Err(DecodingError::NonZeroPadding("uint"));
    }
    Ok(value)
}

/// Decode a signed integer, rejecting values outside the declared width's
/// two's-complement range (improper sign extension).
pub fn decode_int(word: &[u8; WORD], bits: usize) -> Result<I256, DecodingError> {
    let value = I256::from_be_bytes(word);
    if !value.fits_bits(bits) {
        return Err(DecodingError::NonZeroPadding("int"));
    }
    Ok(value)
}

/// Decode a boolean. Any word other than 0 or 1 is rejected.
pub fn decode_bool(word: &[u8; WORD]) -> Result<bool, DecodingError> {
    if word[..WORD - 1].iter().any(|&b| b != 0) {
        return Err(DecodingError::InvalidBool);
    }
    match word[WORD - 1] {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodingError::InvalidBool),
    }
}

/// Decode an address; the high 12 bytes must be zero.
pub fn decode_address(word: &[u8; WORD]) -> Result<[u8; 20], DecodingError> {
    if word[..12].iter().any(|&b| b != 0) {
        return Err(DecodingError::NonZeroPadding("address"));
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    Ok(address)
}

/// Decode `bytesN` content; the trailing padding must be zero.
pub fn decode_fixed_bytes(word: &[u8; WORD], n: usize) -> Result<Vec<u8>, DecodingError> {
    if word[n..].iter().any(|&b| b != 0) {
        return Err(DecodingError::NonZeroPadding("bytesN"));
    }
    Ok(word[..n].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_lengths() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 32);
        assert_eq!(padded_len(32), 32);
        assert_eq!(padded_len(33), 64);
    }

    #[test]
    fn uint_range_checks() {
        assert!(uint_word(&U256::from(255), 8, 0).is_ok());
        assert_eq!(
            uint_word(&U256::from(256), 8, 3),
            Err(EncodingError::IntegerOverflow {
                position: 3,
                bits: 8
            })
        );
        let word = uint_word(&U256::from(256), 16, 0).unwrap();
        assert_eq!(word[30], 1);
        assert_eq!(word[31], 0);
    }

    #[test]
    fn int_range_checks() {
        assert!(int_word(&I256::from(-128), 8, 0).is_ok());
        assert!(int_word(&I256::from(-129), 8, 0).is_err());
        assert!(int_word(&I256::from(127), 8, 0).is_ok());
        assert!(int_word(&I256::from(128), 8, 0).is_err());
    }

    #[test]
    fn bool_words() {
        assert_eq!(bool_word(true)[31], 1);
        assert_eq!(bool_word(false), [0u8; 32]);

        assert_eq!(decode_bool(&bool_word(true)), Ok(true));
        assert_eq!(decode_bool(&bool_word(false)), Ok(false));

        let mut two = [0u8; 32];
        two[31] = 2;
        assert_eq!(decode_bool(&two), Err(DecodingError::InvalidBool));
        let mut high = [0u8; 32];
        high[0] = 1;
        high[31] = 1;
        assert_eq!(decode_bool(&high), Err(DecodingError::InvalidBool));
    }

    #[test]
    fn address_padding() {
        let addr = [0xab; 20];
        let word = address_word(&addr);
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(decode_address(&word), Ok(addr));

        let mut dirty = word;
        dirty[0] = 1;
        assert_eq!(
            decode_address(&dirty),
            Err(DecodingError::NonZeroPadding("address"))
        );
    }

    #[test]
    fn fixed_bytes_alignment() {
        let word = fixed_bytes_word(&[0xde, 0xad, 0xbe, 0xef], 4, 0).unwrap();
        assert_eq!(&word[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&word[4..], &[0u8; 28]);
        assert_eq!(
            decode_fixed_bytes(&word, 4).unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );

        // Length must match the declared size exactly.
        assert!(fixed_bytes_word(&[0xde, 0xad], 4, 0).is_err());

        let mut dirty = word;
        dirty[31] = 1;
        assert_eq!(
            decode_fixed_bytes(&dirty, 4),
            Err(DecodingError::NonZeroPadding("bytesN"))
        );
    }

    #[test]
    fn strict_uint_decode() {
        let word = uint_word(&U256::from(300), 16, 0).unwrap();
        assert!(decode_uint(&word, 16).is_ok());
        assert_eq!(
            decode_uint(&word, 8),
            Err(DecodingError::NonZeroPadding("uint"))
        );
    }

    #[test]
    fn strict_int_decode() {
        let word = int_word(&I256::from(-1), 8, 0).unwrap();
        // -1 sign-extends to all ones; valid at any width.
        assert_eq!(decode_int(&word, 8).unwrap(), I256::from(-1));
        let word = int_word(&I256::from(-300), 16, 0).unwrap();
        assert!(decode_int(&word, 16).is_ok());
        assert!(decode_int(&word, 8).is_err());
    }
}
