//! Recursive length-prefix encoding.
//!
//! Two encoding operations and nothing else: wrap a byte string, wrap a
//! sequence of already-encoded items. Everything the transaction encoder
//! produces is built from these.
//!
//! ## Header layout
//!
//! ```text
//! 0x00..=0x7f  single byte, encoded as itself
//! 0x80..=0xb7  string, payload length = header - 0x80   (< 56 bytes)
//! 0xb8..=0xbf  string, next (header - 0xb7) bytes hold the length
//! 0xc0..=0xf7  list,   payload length = header - 0xc0   (< 56 bytes)
//! 0xf8..=0xff  list,   next (header - 0xf7) bytes hold the length
//! ```
//!
//! The decoder exists for inspection and tests. Production code only ever
//! encodes, so the decoder is lenient about non-canonical input and only
//! rejects what it cannot parse.

use thiserror::Error;

use super::number::to_canonical_bytes;

/// Encoding of the empty byte string.
pub const EMPTY_STRING: u8 = 0x80;

const SHORT_STRING_OFFSET: u8 = 0x80;
const LONG_STRING_OFFSET: u8 = 0xb7;
const SHORT_LIST_OFFSET: u8 = 0xc0;
const LONG_LIST_OFFSET: u8 = 0xf7;

/// Payloads shorter than this carry their length in the header byte.
const SHORT_PAYLOAD_LIMIT: usize = 56;

/// Encodes a byte string.
///
/// A lone `0x00` is returned unchanged. It is below `0x80`, so this is the
/// single-byte rule rather than a special case, but it is spelled out
/// because the canonical form of the chain depends on it.
pub fn encode_element(bytes: &[u8]) -> Vec<u8> {
    match bytes {
        [] => vec![EMPTY_STRING],
        [0x00] => vec![0x00],
        [b] if *b < SHORT_STRING_OFFSET => vec![*b],
        _ => with_header(SHORT_STRING_OFFSET, LONG_STRING_OFFSET, bytes),
    }
}

/// Encodes a list whose items are already encoded.
///
/// Items are concatenated as-is; the caller decides which of them are
/// elements and which are nested lists.
pub fn encode_list<I, T>(items: I) -> Vec<u8>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut payload = Vec::new();
    for item in items {
        payload.extend_from_slice(item.as_ref());
    }
    with_header(SHORT_LIST_OFFSET, LONG_LIST_OFFSET, &payload)
}

fn with_header(short_offset: u8, long_offset: u8, payload: &[u8]) -> Vec<u8> {
    let len = payload.len();
    if len < SHORT_PAYLOAD_LIMIT {
        let mut out = Vec::with_capacity(1 + len);
        out.push(short_offset + len as u8);
        out.extend_from_slice(payload);
        return out;
    }

    let len_bytes = to_canonical_bytes(len as u64);
    let mut out = Vec::with_capacity(1 + len_bytes.len() + len);
    out.push(long_offset + len_bytes.len() as u8);
    out.extend_from_slice(&len_bytes);
    out.extend_from_slice(payload);
    out
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Errors from the inspection decoder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("input ended early: needed {needed} more bytes")]
    UnexpectedEnd { needed: usize },

    #[error("{0} trailing bytes after top-level item")]
    TrailingBytes(usize),

    #[error("declared length does not fit in memory")]
    LengthOverflow,

    #[error("expected a byte string")]
    ExpectedBytes,

    #[error("expected a list")]
    ExpectedList,
}

/// A decoded item: either a byte string or a list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn as_bytes(&self) -> Result<&[u8], DecodeError> {
        match self {
            Self::Bytes(b) => Ok(b.as_slice()),
            Self::List(_) => Err(DecodeError::ExpectedBytes),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], DecodeError> {
        match self {
            Self::List(items) => Ok(items.as_slice()),
            Self::Bytes(_) => Err(DecodeError::ExpectedList),
        }
    }

    /// Interprets a byte string as a big-endian unsigned integer.
    pub fn as_u64(&self) -> Result<u64, DecodeError> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 8 {
            return Err(DecodeError::LengthOverflow);
        }
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }
}

/// Decodes exactly one top-level item, rejecting trailing bytes.
pub fn decode(input: &[u8]) -> Result<RlpItem, DecodeError> {
    let (item, rest) = decode_item(input)?;
    if !rest.is_empty() {
        return Err(DecodeError::TrailingBytes(rest.len()));
    }
    Ok(item)
}

fn decode_item(input: &[u8]) -> Result<(RlpItem, &[u8]), DecodeError> {
    let (&first, rest) = input
        .split_first()
        .ok_or(DecodeError::UnexpectedEnd { needed: 1 })?;

    match first {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![first]), rest)),
        0x80..=0xb7 => {
            let len = (first - SHORT_STRING_OFFSET) as usize;
            let (payload, rest) = take(rest, len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xb8..=0xbf => {
            let (len, rest) = read_length(rest, (first - LONG_STRING_OFFSET) as usize)?;
            let (payload, rest) = take(rest, len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xc0..=0xf7 => {
            let len = (first - SHORT_LIST_OFFSET) as usize;
            let (payload, rest) = take(rest, len)?;
            Ok((RlpItem::List(decode_sequence(payload)?), rest))
        }
        0xf8..=0xff => {
            let (len, rest) = read_length(rest, (first - LONG_LIST_OFFSET) as usize)?;
            let (payload, rest) = take(rest, len)?;
            Ok((RlpItem::List(decode_sequence(payload)?), rest))
        }
    }
}

fn decode_sequence(mut payload: &[u8]) -> Result<Vec<RlpItem>, DecodeError> {
    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, rest) = decode_item(payload)?;
        items.push(item);
        payload = rest;
    }
    Ok(items)
}

fn read_length(input: &[u8], len_of_len: usize) -> Result<(usize, &[u8]), DecodeError> {
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(DecodeError::LengthOverflow);
    }
    let (len_bytes, rest) = take(input, len_of_len)?;
    let len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    Ok((len, rest))
}

fn take(input: &[u8], len: usize) -> Result<(&[u8], &[u8]), DecodeError> {
    if input.len() < len {
        return Err(DecodeError::UnexpectedEnd {
            needed: len - input.len(),
        });
    }
    Ok(input.split_at(len))
}
