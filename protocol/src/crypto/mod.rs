//! # Cryptographic Primitives
//!
//! Hashing, domain separation, account keys and signatures. Every byte the
//! chain will verify passes through here.
//!
//! The chain fixes the menu and we serve exactly what is on it:
//!
//! - **ECDSA P-256** and **ECDSA secp256k1** for account keys.
//! - **SHA2-256** and **SHA3-256** for message hashing.
//!
//! Which combination applies is a property of the account key, not of the
//! caller. A key registered as P-256/SHA3 only ever verifies P-256/SHA3
//! signatures, so every entry point here takes both selectors explicitly.
//!
//! ## Rolling our own
//!
//! We don't. Curve arithmetic and hashing come from the RustCrypto crates;
//! this module only decides the byte layout around them.

pub mod hash;
pub mod keys;
pub mod signatures;

use thiserror::Error;

pub use hash::{add_domain_tag, hash, sha2_256, sha3_256, transaction_domain_tag, HashAlgorithm};
pub use keys::{PrivateKey, PublicKey, SignatureAlgorithm};
pub use signatures::{sign, sign_with, verify};

/// Errors from key handling and signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Curve or hash selector outside the supported set.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Private key bytes are the wrong length or not a valid scalar.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Public key bytes are the wrong length or not a point on the curve.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature could not be brought into the 64-byte layout.
    #[error("invalid signature")]
    InvalidSignature,

    #[error("signing failed")]
    SigningFailed,
}
