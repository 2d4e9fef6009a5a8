//! Canonical transaction encodings.
//!
//! Three nested RLP structures, each wrapping the previous one:
//!
//! ```text
//! payload                = [script, [args..], ref_block, gas, proposer, key_idx, seq, payer, [authorizers..]]
//! authorization envelope = [payload, [payload_sigs..]]
//! payment envelope       = [authorization envelope, [envelope_sigs..]]
//! signature              = [signer_index, key_index, sig]
//! ```
//!
//! Field order, padding width and element-versus-list placement all matter.
//! Getting any of them wrong does not fail here; it fails at the chain's
//! signature check, much later and much less helpfully.

use super::builder::Transaction;
use super::types::TransactionSignature;
use crate::encoding::{encode_element, encode_list, encode_number};

/// Encodes the payload: the transaction body with no signatures.
pub fn encode_payload(tx: &Transaction) -> Vec<u8> {
    let proposal_key = tx.proposal_key();
    let arguments = encode_list(tx.arguments().iter().map(|arg| encode_element(arg)));
    let authorizers = encode_list(
        tx.authorizers()
            .iter()
            .map(|addr| encode_element(addr.as_bytes())),
    );

    encode_list([
        encode_element(tx.script().as_bytes()),
        arguments,
        encode_element(tx.reference_block_id().as_bytes()),
        encode_number(tx.gas_limit()),
        encode_element(proposal_key.address.as_bytes()),
        encode_number(u64::from(proposal_key.key_index)),
        encode_number(proposal_key.sequence_number),
        encode_element(tx.payer().as_bytes()),
        authorizers,
    ])
}

/// Encodes the payload together with the payload signatures.
///
/// This is what the payer signs.
pub fn encode_authorization_envelope(tx: &Transaction) -> Vec<u8> {
    encode_list([
        encode_payload(tx),
        encode_signatures(tx.payload_signatures()),
    ])
}

/// Encodes the authorization envelope together with the envelope signatures.
///
/// This is the fully signed transaction.
pub fn encode_payment_envelope(tx: &Transaction) -> Vec<u8> {
    encode_list([
        encode_authorization_envelope(tx),
        encode_signatures(tx.envelope_signatures()),
    ])
}

/// Encodes a single signature as `[signer_index, key_index, sig]`.
pub fn encode_signature(signature: &TransactionSignature) -> Vec<u8> {
    encode_list([
        encode_number(u64::from(signature.signer_index)),
        encode_number(u64::from(signature.key_index)),
        encode_element(&signature.signature),
    ])
}

fn encode_signatures(signatures: &[TransactionSignature]) -> Vec<u8> {
    encode_list(signatures.iter().map(encode_signature))
}
