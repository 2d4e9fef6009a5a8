//! Data returned by an access node.
//!
//! These mirror what the chain reports, trimmed to the fields the
//! submission path reads.

use serde::{Deserialize, Serialize};

use crate::config::parse_error_code;
use crate::crypto::{HashAlgorithm, SignatureAlgorithm};
use crate::transaction::{Address, Identifier};

// ---------------------------------------------------------------------------
// Blocks & Accounts
// ---------------------------------------------------------------------------

/// Header of the latest sealed block, used as a transaction's reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: Identifier,
    pub height: u64,
}

/// One key registered on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub index: u32,
    /// Raw 64-byte public key.
    #[serde(with = "hex_key")]
    pub public_key: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    pub weight: u32,
    pub sequence_number: u64,
    pub revoked: bool,
}

impl AccountKey {
    /// Hex of the public key. Used as the identity of this key in the
    /// sequence tracker.
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }
}

/// An account and its keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub keys: Vec<AccountKey>,
}

impl Account {
    /// Looks up a key by its on-chain index.
    pub fn key(&self, index: u32) -> Option<&AccountKey> {
        self.keys.iter().find(|k| k.index == index)
    }
}

// ---------------------------------------------------------------------------
// Transaction Results
// ---------------------------------------------------------------------------

/// Where a submitted transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Unknown,
    Pending,
    Finalized,
    Executed,
    Sealed,
    Expired,
}

impl TransactionStatus {
    /// True once the result can no longer change in a way that matters to
    /// sequence tracking.
    ///
    /// `Finalized` is excluded: execution errors, including
    /// sequence mismatches, are only reported from `Executed` onward.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Executed | Self::Sealed | Self::Expired)
    }
}

/// An event emitted during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub transaction_index: u32,
    pub event_index: u32,
    pub payload: serde_json::Value,
}

/// Result of a transaction as reported by an access node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub status: TransactionStatus,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl TransactionResult {
    pub fn pending() -> Self {
        Self {
            status: TransactionStatus::Pending,
            error_message: String::new(),
            events: Vec::new(),
        }
    }

    /// Numeric execution error code, if the error message carries one.
    pub fn error_code(&self) -> Option<u32> {
        parse_error_code(&self.error_message)
    }

    /// True if the chain rejected the proposal key's sequence number.
    pub fn is_sequence_mismatch(&self, mismatch_code: u32) -> bool {
        self.error_code() == Some(mismatch_code)
    }
}

mod hex_key {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SEQUENCE_NUMBER_MISMATCH_CODE;

    #[test]
    fn finalized_is_not_final() {
        assert!(!TransactionStatus::Finalized.is_final());
        assert!(!TransactionStatus::Pending.is_final());
        assert!(TransactionStatus::Executed.is_final());
        assert!(TransactionStatus::Sealed.is_final());
        assert!(TransactionStatus::Expired.is_final());
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&TransactionStatus::Sealed).unwrap();
        assert_eq!(json, "\"SEALED\"");
    }

    #[test]
    fn mismatch_detection() {
        let result = TransactionResult {
            status: TransactionStatus::Executed,
            error_message: "[Error Code: 1007] invalid proposal key".into(),
            events: vec![],
        };
        assert!(result.is_sequence_mismatch(SEQUENCE_NUMBER_MISMATCH_CODE));
        assert!(!result.is_sequence_mismatch(1101));
        assert!(!TransactionResult::pending().is_sequence_mismatch(SEQUENCE_NUMBER_MISMATCH_CODE));
    }

    #[test]
    fn account_key_lookup() {
        let account = Account {
            address: Address::new([0; 8]),
            keys: vec![AccountKey {
                index: 3,
                public_key: vec![0xAB; 64],
                signature_algorithm: SignatureAlgorithm::EcdsaP256,
                hash_algorithm: HashAlgorithm::Sha3_256,
                weight: 1000,
                sequence_number: 4,
                revoked: false,
            }],
        };
        assert_eq!(account.key(3).unwrap().sequence_number, 4);
        assert!(account.key(0).is_none());
        assert_eq!(account.key(3).unwrap().public_key_hex(), "ab".repeat(64));
    }
}
