//! # Key Management
//!
//! ECDSA key pairs on the two curves the chain accepts for account keys.
//!
//! An account key on-chain records its curve, its hash algorithm and its
//! raw public key. This module covers the curve and the key material; the
//! hash algorithm travels alongside and is applied by
//! [`super::signatures::sign`].
//!
//! ## Public key format
//!
//! The chain stores public keys as 64 raw bytes: the uncompressed X and Y
//! coordinates without the SEC1 `0x04` prefix. Conversion to and from SEC1
//! happens here and nowhere else.
//!
//! ## Security considerations
//!
//! - Private keys are never logged. `Debug` on [`PrivateKey`] is redacted.
//! - Generation uses `OsRng`.

use k256::ecdsa::{SigningKey as K256SigningKey, VerifyingKey as K256VerifyingKey};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::CryptoError;
use crate::config::{PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};

/// Signature algorithm (curve) attached to an account key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "ECDSA_P256")]
    EcdsaP256,
    #[serde(rename = "ECDSA_secp256k1")]
    EcdsaSecp256k1,
}

impl SignatureAlgorithm {
    /// Numeric code as stored on-chain.
    pub fn code(&self) -> u32 {
        match self {
            Self::EcdsaP256 => 2,
            Self::EcdsaSecp256k1 => 3,
        }
    }

    /// Resolves an on-chain numeric code.
    pub fn from_code(code: u32) -> Result<Self, CryptoError> {
        match code {
            2 => Ok(Self::EcdsaP256),
            3 => Ok(Self::EcdsaSecp256k1),
            other => Err(CryptoError::UnsupportedAlgorithm(format!(
                "signature algorithm code {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EcdsaP256 => write!(f, "ECDSA_P256"),
            Self::EcdsaSecp256k1 => write!(f, "ECDSA_secp256k1"),
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ECDSA_P256" | "P256" | "SECP256R1" => Ok(Self::EcdsaP256),
            "ECDSA_SECP256K1" | "SECP256K1" => Ok(Self::EcdsaSecp256k1),
            _ => Err(CryptoError::UnsupportedAlgorithm(format!(
                "signature algorithm {:?}",
                s
            ))),
        }
    }
}

/// A private signing key on one of the supported curves.
///
/// Intentionally not `Serialize`. Exporting key material goes through
/// [`PrivateKey::to_bytes`] so it is always a deliberate act.
#[derive(Clone)]
pub enum PrivateKey {
    P256(P256SigningKey),
    Secp256k1(K256SigningKey),
}

impl PrivateKey {
    /// Generates a fresh key on the requested curve.
    pub fn generate(algorithm: SignatureAlgorithm) -> Self {
        match algorithm {
            SignatureAlgorithm::EcdsaP256 => Self::P256(P256SigningKey::random(&mut OsRng)),
            SignatureAlgorithm::EcdsaSecp256k1 => {
                Self::Secp256k1(K256SigningKey::random(&mut OsRng))
            }
        }
    }

    /// Parses a 32-byte big-endian private scalar.
    ///
    /// Wrong length, zero, or a scalar outside the curve order is rejected.
    pub fn from_bytes(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(CryptoError::InvalidPrivateKey);
        }
        match algorithm {
            SignatureAlgorithm::EcdsaP256 => P256SigningKey::from_slice(bytes)
                .map(Self::P256)
                .map_err(|_| CryptoError::InvalidPrivateKey),
            SignatureAlgorithm::EcdsaSecp256k1 => K256SigningKey::from_slice(bytes)
                .map(Self::Secp256k1)
                .map_err(|_| CryptoError::InvalidPrivateKey),
        }
    }

    /// Parses a hex-encoded private scalar, with or without `0x`.
    pub fn from_hex(algorithm: SignatureAlgorithm, hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_bytes(algorithm, &bytes)
    }

    /// The curve this key lives on.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::P256(_) => SignatureAlgorithm::EcdsaP256,
            Self::Secp256k1(_) => SignatureAlgorithm::EcdsaSecp256k1,
        }
    }

    /// Derives the matching public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::P256(sk) => PublicKey::from_p256(sk.verifying_key()),
            Self::Secp256k1(sk) => PublicKey::from_k256(sk.verifying_key()),
        }
    }

    /// Exports the raw 32-byte private scalar.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        let mut out = [0u8; PRIVATE_KEY_LENGTH];
        match self {
            Self::P256(sk) => out.copy_from_slice(&sk.to_bytes()),
            Self::Secp256k1(sk) => out.copy_from_slice(&sk.to_bytes()),
        }
        out
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm())
            .field("public_key", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}

/// A public key in the chain's raw 64-byte form, tagged with its curve.
///
/// Construction validates that the bytes are a point on the curve, so a
/// `PublicKey` in hand is always usable for verification.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPublicKey")]
pub struct PublicKey {
    algorithm: SignatureAlgorithm,
    #[serde(with = "hex_bytes")]
    bytes: Vec<u8>,
}

/// Wire shape of a [`PublicKey`] before the curve check.
#[derive(Deserialize)]
struct RawPublicKey {
    algorithm: SignatureAlgorithm,
    #[serde(with = "hex_bytes")]
    bytes: Vec<u8>,
}

impl TryFrom<RawPublicKey> for PublicKey {
    type Error = CryptoError;

    fn try_from(raw: RawPublicKey) -> Result<Self, Self::Error> {
        Self::from_bytes(raw.algorithm, &raw.bytes)
    }
}

impl PublicKey {
    /// Parses 64 raw bytes (X || Y) on the given curve.
    pub fn from_bytes(algorithm: SignatureAlgorithm, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidPublicKey);
        }
        let mut sec1 = Vec::with_capacity(1 + PUBLIC_KEY_LENGTH);
        sec1.push(0x04);
        sec1.extend_from_slice(bytes);
        match algorithm {
            SignatureAlgorithm::EcdsaP256 => {
                P256VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::InvalidPublicKey)?;
            }
            SignatureAlgorithm::EcdsaSecp256k1 => {
                K256VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| CryptoError::InvalidPublicKey)?;
            }
        }
        Ok(Self {
            algorithm,
            bytes: bytes.to_vec(),
        })
    }

    /// Parses a hex-encoded raw public key, with or without `0x`.
    pub fn from_hex(algorithm: SignatureAlgorithm, hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(algorithm, &bytes)
    }

    fn from_p256(vk: &P256VerifyingKey) -> Self {
        let point = vk.to_encoded_point(false);
        Self {
            algorithm: SignatureAlgorithm::EcdsaP256,
            bytes: point.as_bytes()[1..].to_vec(),
        }
    }

    fn from_k256(vk: &K256VerifyingKey) -> Self {
        let point = vk.to_encoded_point(false);
        Self {
            algorithm: SignatureAlgorithm::EcdsaSecp256k1,
            bytes: point.as_bytes()[1..].to_vec(),
        }
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Raw 64-byte X || Y.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// SEC1 uncompressed encoding, used when handing the key to a verifier.
    pub(crate) fn to_sec1(&self) -> Vec<u8> {
        let mut sec1 = Vec::with_capacity(1 + PUBLIC_KEY_LENGTH);
        sec1.push(0x04);
        sec1.extend_from_slice(&self.bytes);
        sec1
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.algorithm, self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
