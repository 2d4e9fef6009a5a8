//! # Hashing & Domain Tags
//!
//! Two hash functions, chosen per account key, and refusing to support more
//! without a very good reason:
//!
//! - **SHA2-256**: the default for keys created by most wallets.
//! - **SHA3-256**: what the emulator and a good share of older accounts use.
//!
//! The chain stores the hash algorithm next to every public key, so the
//! signer does not get to pick. It hashes with whatever the key says, or it
//! produces a signature the verifier will recompute differently.
//!
//! ## Domain separation
//!
//! Every transaction message is prefixed with a fixed 32-byte tag before
//! hashing. A signature over a transaction therefore can never be replayed
//! as a signature over some other kind of message (user messages, account
//! proofs) that happens to share bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Sha3_256;
use std::fmt;
use std::str::FromStr;

use super::CryptoError;
use crate::config::{DOMAIN_TAG_LENGTH, HASH_OUTPUT_LENGTH, TRANSACTION_DOMAIN_TAG};

/// Hash algorithm attached to an account key.
///
/// Wire names and numeric codes follow the chain's registry; anything else
/// is rejected with [`CryptoError::UnsupportedAlgorithm`] instead of being
/// quietly mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    #[serde(rename = "SHA3_256")]
    Sha3_256,
}

impl HashAlgorithm {
    /// Numeric code as stored on-chain.
    pub fn code(&self) -> u32 {
        match self {
            Self::Sha2_256 => 1,
            Self::Sha3_256 => 3,
        }
    }

    /// Resolves an on-chain numeric code.
    pub fn from_code(code: u32) -> Result<Self, CryptoError> {
        match code {
            1 => Ok(Self::Sha2_256),
            3 => Ok(Self::Sha3_256),
            other => Err(CryptoError::UnsupportedAlgorithm(format!(
                "hash algorithm code {}",
                other
            ))),
        }
    }

    /// Hashes `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
        match self {
            Self::Sha2_256 => sha2_256(data),
            Self::Sha3_256 => sha3_256(data),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha2_256 => write!(f, "SHA2_256"),
            Self::Sha3_256 => write!(f, "SHA3_256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "SHA2_256" | "SHA256" => Ok(Self::Sha2_256),
            "SHA3_256" => Ok(Self::Sha3_256),
            _ => Err(CryptoError::UnsupportedAlgorithm(format!(
                "hash algorithm {:?}",
                s
            ))),
        }
    }
}

/// Hashes `data` with the given algorithm.
///
/// # Example
///
/// ```
/// use flowkit_protocol::crypto::hash::{hash, HashAlgorithm};
///
/// let digest = hash(b"flow", HashAlgorithm::Sha3_256);
/// assert_eq!(digest.len(), 32);
/// ```
pub fn hash(data: &[u8], algorithm: HashAlgorithm) -> [u8; HASH_OUTPUT_LENGTH] {
    algorithm.digest(data)
}

/// Compute the SHA2-256 digest of `data`.
pub fn sha2_256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute the SHA3-256 digest of `data`.
pub fn sha3_256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// The transaction domain tag, right-padded with zeros to 32 bytes.
pub const fn transaction_domain_tag() -> [u8; DOMAIN_TAG_LENGTH] {
    let tag = TRANSACTION_DOMAIN_TAG.as_bytes();
    let mut out = [0u8; DOMAIN_TAG_LENGTH];
    let mut i = 0;
    while i < tag.len() {
        out[i] = tag[i];
        i += 1;
    }
    out
}

/// Prefixes canonical transaction bytes with the transaction domain tag.
pub fn add_domain_tag(message: &[u8]) -> Vec<u8> {
    let mut tagged = Vec::with_capacity(DOMAIN_TAG_LENGTH + message.len());
    tagged.extend_from_slice(&transaction_domain_tag());
    tagged.extend_from_slice(message);
    tagged
}
