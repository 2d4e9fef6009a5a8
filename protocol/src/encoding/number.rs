//! Minimal big-endian integers.
//!
//! The chain encodes every integer field (gas limit, key index, sequence
//! number, signer index) as the shortest big-endian byte string that
//! represents it. No leading zero bytes, ever. Zero itself is the empty
//! string, which the element encoder then turns into `0x80`.

use super::rlp::encode_element;

/// Converts an integer into its minimal big-endian byte string.
///
/// `to_be_bytes` takes care of host endianness; all that remains is to
/// drop the leading zero bytes.
pub fn to_canonical_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first_significant = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len());
    bytes[first_significant..].to_vec()
}

/// Canonicalizes an integer and wraps it as an RLP element in one step.
pub fn encode_number(value: u64) -> Vec<u8> {
    encode_element(&to_canonical_bytes(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty() {
        assert!(to_canonical_bytes(0).is_empty());
        assert_eq!(encode_number(0), vec![0x80]);
    }

    #[test]
    fn two_fifty_six_has_no_leading_zero() {
        assert_eq!(to_canonical_bytes(256), vec![0x01, 0x00]);
        assert_eq!(encode_number(256), vec![0x82, 0x01, 0x00]);
    }

    #[test]
    fn small_values_encode_as_themselves() {
        assert_eq!(encode_number(5), vec![0x05]);
        assert_eq!(encode_number(0x7f), vec![0x7f]);
        // 0x80 no longer fits in a single self-describing byte.
        assert_eq!(encode_number(0x80), vec![0x81, 0x80]);
    }

    #[test]
    fn max_value_uses_all_eight_bytes() {
        assert_eq!(to_canonical_bytes(u64::MAX), vec![0xFF; 8]);
    }

    #[test]
    fn no_output_starts_with_zero() {
        for value in [1u64, 255, 256, 65_535, 65_536, 1 << 40, u64::MAX] {
            let bytes = to_canonical_bytes(value);
            assert_ne!(bytes.first(), Some(&0), "leading zero for {}", value);
        }
    }
}
