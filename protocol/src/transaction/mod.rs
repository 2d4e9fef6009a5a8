//! # Transaction Module
//!
//! The transaction model and the three canonical byte strings the chain
//! hashes and verifies.
//!
//! ## Architecture
//!
//! ```text
//! types.rs      Address, Identifier, ProposalKey, TransactionSignature
//! builder.rs    Transaction (with its signer-index map) and TransactionBuilder
//! encoding.rs   payload, authorization envelope, payment envelope
//! signing.rs    TransactionSigner trait, LocalSigner, role-based signing
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] assembles the body.
//! 2. **Sign payload**: proposer and authorizers that are not the payer sign
//!    the tagged payload.
//! 3. **Sign envelope**: the payer signs the tagged authorization envelope,
//!    which already contains the payload signatures.
//! 4. **Send**: the payment envelope is the wire form.
//!
//! ## Design Decisions
//!
//! - Fixed-width fields are stored padded. An overlong address fails when
//!   it is parsed, long before anything is signed.
//! - Signer indices are owned by the transaction and never reassigned.
//!   Changing the body after signing drops the signatures but keeps the
//!   indices.

pub mod builder;
pub mod encoding;
pub mod signing;
pub mod types;

pub use builder::{Transaction, TransactionBuilder};
pub use encoding::{
    encode_authorization_envelope, encode_payload, encode_payment_envelope, encode_signature,
};
pub use signing::{
    sign_envelope, sign_payload, sign_transaction, LocalSigner, SigningError, TransactionSigner,
};
pub use types::{Address, Identifier, ProposalKey, TransactionSignature};
