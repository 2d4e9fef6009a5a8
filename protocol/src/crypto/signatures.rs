//! # Digital Signatures
//!
//! ECDSA over P-256 or secp256k1, hashed with whichever algorithm the
//! account key specifies, emitted in the chain's fixed 64-byte layout.
//!
//! ## Output layout
//!
//! ```text
//! [ r: 32 bytes, big-endian, left-padded ][ s: 32 bytes, big-endian, left-padded ]
//! ```
//!
//! No DER framing and no recovery id. A component that happens to have
//! leading zero bytes is still padded to its full 32 bytes; a verifier that
//! splits at byte 32 must find r and s exactly there.
//!
//! ## Malleability
//!
//! No low-s normalization is applied on top of what the curve library
//! emits. The chain's verifier accepts either form of `s`.

use k256::ecdsa::{Signature as K256Signature, VerifyingKey as K256VerifyingKey};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature as P256Signature, VerifyingKey as P256VerifyingKey};

use super::hash::HashAlgorithm;
use super::keys::{PrivateKey, PublicKey, SignatureAlgorithm};
use super::CryptoError;
use crate::config::{SIGNATURE_COMPONENT_LENGTH, SIGNATURE_LENGTH};

/// Signs `message` with `private_key`, hashing first with `hash_algorithm`.
///
/// The curve comes from the key itself.
///
/// # Example
///
/// ```
/// use flowkit_protocol::crypto::{sign, verify, HashAlgorithm, PrivateKey, SignatureAlgorithm};
///
/// let key = PrivateKey::generate(SignatureAlgorithm::EcdsaP256);
/// let sig = sign(&key, HashAlgorithm::Sha3_256, b"hello").unwrap();
/// assert_eq!(sig.len(), 64);
/// assert!(verify(&key.public_key(), HashAlgorithm::Sha3_256, b"hello", &sig));
/// ```
pub fn sign(
    private_key: &PrivateKey,
    hash_algorithm: HashAlgorithm,
    message: &[u8],
) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
    let digest = hash_algorithm.digest(message);
    match private_key {
        PrivateKey::P256(sk) => {
            let signature: P256Signature = sk
                .sign_prehash(&digest)
                .map_err(|_| CryptoError::SigningFailed)?;
            let (r, s) = signature.split_bytes();
            fixed_width(&r, &s)
        }
        PrivateKey::Secp256k1(sk) => {
            let signature: K256Signature = sk
                .sign_prehash(&digest)
                .map_err(|_| CryptoError::SigningFailed)?;
            let (r, s) = signature.split_bytes();
            fixed_width(&r, &s)
        }
    }
}

/// Signs with raw key material, resolving curve and hash from selectors.
///
/// This is the entry point for callers that hold a key as bytes plus the
/// account key's metadata, rather than a parsed [`PrivateKey`].
pub fn sign_with(
    curve: SignatureAlgorithm,
    hash_algorithm: HashAlgorithm,
    private_key: &[u8],
    message: &[u8],
) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
    let key = PrivateKey::from_bytes(curve, private_key)?;
    sign(&key, hash_algorithm, message)
}

/// Verifies a 64-byte signature against a public key.
///
/// Returns `false` for any failure (wrong length, malformed scalars, wrong
/// key, wrong message). Callers that need to know *why* are asking the
/// wrong question.
pub fn verify(
    public_key: &PublicKey,
    hash_algorithm: HashAlgorithm,
    message: &[u8],
    signature: &[u8],
) -> bool {
    if signature.len() != SIGNATURE_LENGTH {
        return false;
    }
    let digest = hash_algorithm.digest(message);
    let sec1 = public_key.to_sec1();

    match public_key.algorithm() {
        SignatureAlgorithm::EcdsaP256 => {
            let Ok(vk) = P256VerifyingKey::from_sec1_bytes(&sec1) else {
                return false;
            };
            let Ok(sig) = P256Signature::from_slice(signature) else {
                return false;
            };
            vk.verify_prehash(&digest, &sig).is_ok()
        }
        SignatureAlgorithm::EcdsaSecp256k1 => {
            let Ok(vk) = K256VerifyingKey::from_sec1_bytes(&sec1) else {
                return false;
            };
            let Ok(sig) = K256Signature::from_slice(signature) else {
                return false;
            };
            vk.verify_prehash(&digest, &sig).is_ok()
        }
    }
}

/// Left-pads r and s to 32 bytes each and concatenates them.
fn fixed_width(r: &[u8], s: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
    if r.len() > SIGNATURE_COMPONENT_LENGTH || s.len() > SIGNATURE_COMPONENT_LENGTH {
        return Err(CryptoError::InvalidSignature);
    }
    let mut out = [0u8; SIGNATURE_LENGTH];
    out[SIGNATURE_COMPONENT_LENGTH - r.len()..SIGNATURE_COMPONENT_LENGTH].copy_from_slice(r);
    out[SIGNATURE_LENGTH - s.len()..].copy_from_slice(s);
    Ok(out)
}
