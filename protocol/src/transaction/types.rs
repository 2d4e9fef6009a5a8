//! Value types shared by transactions and the network layer.
//!
//! Addresses and identifiers are stored at their fixed wire width, so a
//! value of these types is always already padded. Conversions from user
//! input are where an overlong field gets rejected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::{ADDRESS_LENGTH, IDENTIFIER_LENGTH};
use crate::encoding::{left_pad, padded_from_hex, EncodingError};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An 8-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds an address from up to 8 bytes, left-padding shorter input.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        left_pad("address", bytes).map(Self)
    }

    /// Parses hex with or without `0x`. Short forms such as `0x1` are padded.
    pub fn from_hex(input: &str) -> Result<Self, EncodingError> {
        padded_from_hex("address", input).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Lowercase hex with the `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// A 32-byte block or transaction identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Identifier([u8; IDENTIFIER_LENGTH]);

impl Identifier {
    pub const ZERO: Self = Self([0u8; IDENTIFIER_LENGTH]);

    pub const fn new(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        left_pad("identifier", bytes).map(Self)
    }

    pub fn from_hex(input: &str) -> Result<Self, EncodingError> {
        padded_from_hex("identifier", input).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LENGTH] {
        &self.0
    }

    /// Lowercase hex without a prefix, the way access nodes print ids.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.to_hex())
    }
}

impl FromStr for Identifier {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ProposalKey
// ---------------------------------------------------------------------------

/// The (address, key index, sequence number) tuple that orders a
/// transaction against every other transaction proposed by the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalKey {
    pub address: Address,
    pub key_index: u32,
    pub sequence_number: u64,
}

// ---------------------------------------------------------------------------
// TransactionSignature
// ---------------------------------------------------------------------------

/// One signature attached to a transaction.
///
/// `signer_index` is resolved through the owning transaction's signer map
/// when the signature is attached; it is never chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub address: Address,
    pub signer_index: u32,
    pub key_index: u32,
    #[serde(with = "hex_signature")]
    pub signature: Vec<u8>,
}

mod hex_signature {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_short_hex_is_left_padded() {
        let addr = Address::from_hex("0x1").unwrap();
        assert_eq!(addr.as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(addr.to_hex(), "0x0000000000000001");
    }

    #[test]
    fn address_rejects_nine_bytes() {
        let err = Address::from_hex("0x010203040506070809").unwrap_err();
        assert_eq!(
            err,
            EncodingError::FieldTooLong {
                field: "address",
                width: 8,
                actual: 9
            }
        );
    }

    #[test]
    fn address_serde_uses_prefixed_hex() {
        let addr: Address = "f8d6e0586b0a20c7".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0xf8d6e0586b0a20c7\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn identifier_pads_to_32_bytes() {
        let id = Identifier::from_slice(&[0xAB]).unwrap();
        assert_eq!(id.as_bytes()[31], 0xAB);
        assert!(id.as_bytes()[..31].iter().all(|b| *b == 0));
        assert_eq!(Identifier::ZERO.to_hex().len(), 64);
    }

    #[test]
    fn signature_bytes_serialize_as_hex() {
        let sig = TransactionSignature {
            address: Address::new([1; 8]),
            signer_index: 0,
            key_index: 2,
            signature: vec![0xDE, 0xAD],
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["signature"], "dead");
        assert_eq!(json["key_index"], 2);
    }
}
