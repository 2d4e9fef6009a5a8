//! # Canonical Encoding
//!
//! The byte-level layer the rest of the crate builds on. Nothing here knows
//! what a transaction is; it only knows how to turn byte strings, lists of
//! byte strings and unsigned integers into the length-prefixed form the
//! chain hashes.
//!
//! ```text
//! rlp.rs      element/list encoder and an inspection decoder
//! number.rs   fixed-width integers to minimal big-endian bytes
//! ```
//!
//! Fixed-width fields (addresses, block ids) are left-padded here too, since
//! padding is where a silent encoding bug most likely hides.

pub mod number;
pub mod rlp;

pub use number::{encode_number, to_canonical_bytes};
pub use rlp::{decode, encode_element, encode_list, DecodeError, RlpItem};

use thiserror::Error;

/// Errors raised while assembling canonical fields.
///
/// Any of these aborts a submission before a single byte reaches the
/// network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{field} is {actual} bytes, exceeds fixed width of {width}")]
    FieldTooLong {
        field: &'static str,
        width: usize,
        actual: usize,
    },

    #[error("{field} is not valid hex")]
    InvalidHex { field: &'static str },

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Left-pads `bytes` with zeros to exactly `width` bytes.
///
/// Input longer than `width` is rejected rather than truncated: dropping
/// leading bytes would silently change the value being signed.
pub fn left_pad<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], EncodingError> {
    if bytes.len() > N {
        return Err(EncodingError::FieldTooLong {
            field,
            width: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out[N - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

/// Decodes hex (with or without a `0x` prefix) and left-pads to `N` bytes.
pub fn padded_from_hex<const N: usize>(field: &'static str, input: &str) -> Result<[u8; N], EncodingError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    // Odd-length hex is legal shorthand for addresses like "0x1".
    let normalized = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(normalized).map_err(|_| EncodingError::InvalidHex { field })?;
    left_pad(field, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_pad_short_input() {
        let padded: [u8; 8] = left_pad("address", &[0x01, 0x02]).unwrap();
        assert_eq!(padded, [0, 0, 0, 0, 0, 0, 0x01, 0x02]);
    }

    #[test]
    fn left_pad_exact_width_is_unchanged() {
        let input = [0xAB; 8];
        let padded: [u8; 8] = left_pad("address", &input).unwrap();
        assert_eq!(padded, input);
    }

    #[test]
    fn left_pad_rejects_overflow() {
        let err = left_pad::<8>("address", &[0xFF; 9]).unwrap_err();
        assert_eq!(
            err,
            EncodingError::FieldTooLong {
                field: "address",
                width: 8,
                actual: 9
            }
        );
        assert!(err.to_string().contains("exceeds fixed width of 8"));
    }

    #[test]
    fn padded_from_hex_accepts_prefix_and_odd_length() {
        let a: [u8; 8] = padded_from_hex("address", "0x1").unwrap();
        assert_eq!(a, [0, 0, 0, 0, 0, 0, 0, 1]);

        let b: [u8; 8] = padded_from_hex("address", "f8d6e0586b0a20c7").unwrap();
        assert_eq!(hex::encode(b), "f8d6e0586b0a20c7");
    }

    #[test]
    fn padded_from_hex_rejects_garbage() {
        assert_eq!(
            padded_from_hex::<8>("address", "0xzz").unwrap_err(),
            EncodingError::InvalidHex { field: "address" }
        );
    }
}
