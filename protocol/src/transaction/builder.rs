//! Transaction construction via the builder pattern.
//!
//! [`TransactionBuilder`] collects the body fields and hands back an
//! unsigned [`Transaction`]. Signatures are attached afterwards through
//! [`Transaction::add_payload_signature`] and
//! [`Transaction::add_envelope_signature`], which is where signer indices
//! get resolved.
//!
//! The builder does not sign; that happens in [`super::signing`]. This
//! separation keeps construction testable without key material.

use super::encoding::{encode_authorization_envelope, encode_payload, encode_payment_envelope};
use super::types::{Address, Identifier, ProposalKey, TransactionSignature};
use crate::config::DEFAULT_GAS_LIMIT;
use crate::encoding::EncodingError;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A transaction body plus its two signature lists.
///
/// Fields are private because two of them are coupled: the signature lists
/// refer to signers by index into `signers`, and that map must only ever
/// grow. Once an address has an index, it keeps it for the lifetime of the
/// transaction, so payload and envelope signatures from the same account
/// always agree.
///
/// The signer map starts out as the transaction's canonical signer list
/// (proposer, payer, then authorizers, without duplicates). A signature from
/// any other address is appended on first sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    script: String,
    arguments: Vec<Vec<u8>>,
    reference_block_id: Identifier,
    gas_limit: u64,
    proposal_key: ProposalKey,
    payer: Address,
    authorizers: Vec<Address>,
    payload_signatures: Vec<TransactionSignature>,
    envelope_signatures: Vec<TransactionSignature>,
    signers: Vec<Address>,
}

impl Transaction {
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn arguments(&self) -> &[Vec<u8>] {
        &self.arguments
    }

    pub fn reference_block_id(&self) -> &Identifier {
        &self.reference_block_id
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn proposal_key(&self) -> &ProposalKey {
        &self.proposal_key
    }

    pub fn payer(&self) -> Address {
        self.payer
    }

    pub fn authorizers(&self) -> &[Address] {
        &self.authorizers
    }

    pub fn payload_signatures(&self) -> &[TransactionSignature] {
        &self.payload_signatures
    }

    pub fn envelope_signatures(&self) -> &[TransactionSignature] {
        &self.envelope_signatures
    }

    /// Addresses in signer-index order.
    pub fn signers(&self) -> &[Address] {
        &self.signers
    }

    /// Replaces the argument payloads. Drops every attached signature.
    pub fn set_arguments(&mut self, arguments: Vec<Vec<u8>>) {
        self.arguments = arguments;
        self.clear_signatures();
    }

    /// Points the transaction at a different reference block. Drops every
    /// attached signature.
    pub fn set_reference_block_id(&mut self, id: Identifier) {
        self.reference_block_id = id;
        self.clear_signatures();
    }

    /// Sets the proposal key's sequence number. Drops every attached
    /// signature.
    pub fn set_sequence_number(&mut self, sequence_number: u64) {
        self.proposal_key.sequence_number = sequence_number;
        self.clear_signatures();
    }

    /// Returns the signer index for `address`, assigning the next free one
    /// if the address has not been seen before.
    pub fn signer_index(&mut self, address: Address) -> u32 {
        let position = match self.signers.iter().position(|a| *a == address) {
            Some(position) => position,
            None => {
                self.signers.push(address);
                self.signers.len() - 1
            }
        };
        position as u32
    }

    /// Attaches a signature over the payload.
    ///
    /// A second signature for the same (address, key index) replaces the
    /// first.
    pub fn add_payload_signature(&mut self, address: Address, key_index: u32, signature: Vec<u8>) {
        let signature = self.resolve(address, key_index, signature);
        insert_sorted(&mut self.payload_signatures, signature);
    }

    /// Attaches a signature over the authorization envelope.
    pub fn add_envelope_signature(&mut self, address: Address, key_index: u32, signature: Vec<u8>) {
        let signature = self.resolve(address, key_index, signature);
        insert_sorted(&mut self.envelope_signatures, signature);
    }

    /// Canonical payload bytes, without the domain tag.
    pub fn payload_message(&self) -> Vec<u8> {
        encode_payload(self)
    }

    /// Canonical authorization-envelope bytes, without the domain tag.
    pub fn authorization_envelope_message(&self) -> Vec<u8> {
        encode_authorization_envelope(self)
    }

    /// Canonical payment-envelope bytes: the fully signed transaction.
    pub fn payment_envelope_message(&self) -> Vec<u8> {
        encode_payment_envelope(self)
    }

    fn resolve(&mut self, address: Address, key_index: u32, signature: Vec<u8>) -> TransactionSignature {
        TransactionSignature {
            address,
            signer_index: self.signer_index(address),
            key_index,
            signature,
        }
    }

    fn clear_signatures(&mut self) {
        self.payload_signatures.clear();
        self.envelope_signatures.clear();
    }
}

/// Keeps `list` sorted by (signer index, key index).
fn insert_sorted(list: &mut Vec<TransactionSignature>, signature: TransactionSignature) {
    let key = (signature.signer_index, signature.key_index);
    match list.binary_search_by_key(&key, |s| (s.signer_index, s.key_index)) {
        Ok(existing) => list[existing] = signature,
        Err(position) => list.insert(position, signature),
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned transactions.
///
/// # Example
///
/// ```
/// use flowkit_protocol::transaction::{Address, Identifier, ProposalKey, TransactionBuilder};
///
/// let service = Address::from_hex("0xf8d6e0586b0a20c7").unwrap();
/// let tx = TransactionBuilder::new()
///     .script("transaction { execute { log(\"hi\") } }")
///     .reference_block_id(Identifier::ZERO)
///     .proposal_key(ProposalKey { address: service, key_index: 0, sequence_number: 0 })
///     .payer(service)
///     .authorizer(service)
///     .build()
///     .unwrap();
/// assert_eq!(tx.signers(), &[service]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    script: String,
    arguments: Vec<Vec<u8>>,
    reference_block_id: Option<Identifier>,
    gas_limit: Option<u64>,
    proposal_key: Option<ProposalKey>,
    payer: Option<Address>,
    authorizers: Vec<Address>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Appends one already-encoded argument payload.
    pub fn argument(mut self, argument: impl Into<Vec<u8>>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn arguments(mut self, arguments: Vec<Vec<u8>>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn reference_block_id(mut self, id: Identifier) -> Self {
        self.reference_block_id = Some(id);
        self
    }

    /// Defaults to [`DEFAULT_GAS_LIMIT`] when unset.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn proposal_key(mut self, key: ProposalKey) -> Self {
        self.proposal_key = Some(key);
        self
    }

    pub fn payer(mut self, payer: Address) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn authorizer(mut self, authorizer: Address) -> Self {
        self.authorizers.push(authorizer);
        self
    }

    pub fn authorizers(mut self, authorizers: Vec<Address>) -> Self {
        self.authorizers = authorizers;
        self
    }

    /// Finalizes the builder.
    ///
    /// Fails with [`EncodingError::MissingField`] if the reference block,
    /// proposal key or payer was never set.
    pub fn build(self) -> Result<Transaction, EncodingError> {
        let reference_block_id = self
            .reference_block_id
            .ok_or(EncodingError::MissingField("reference_block_id"))?;
        let proposal_key = self
            .proposal_key
            .ok_or(EncodingError::MissingField("proposal_key"))?;
        let payer = self.payer.ok_or(EncodingError::MissingField("payer"))?;

        let mut signers: Vec<Address> = Vec::with_capacity(2 + self.authorizers.len());
        for address in [proposal_key.address, payer]
            .into_iter()
            .chain(self.authorizers.iter().copied())
        {
            if !signers.contains(&address) {
                signers.push(address);
            }
        }

        Ok(Transaction {
            script: self.script,
            arguments: self.arguments,
            reference_block_id,
            gas_limit: self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            proposal_key,
            payer,
            authorizers: self.authorizers,
            payload_signatures: Vec::new(),
            envelope_signatures: Vec::new(),
            signers,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
