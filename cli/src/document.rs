//! JSON transaction documents.
//!
//! The file format `encode` and `sign` read and write. Arguments are kept
//! as JSON-Cadence values in the document and become their compact JSON
//! bytes in the transaction, which is how the chain expects them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowkit_protocol::config::DEFAULT_GAS_LIMIT;
use flowkit_protocol::transaction::{
    Address, Identifier, ProposalKey, Transaction, TransactionBuilder, TransactionSignature,
};

/// A transaction as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDocument {
    pub script: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    pub reference_block_id: Identifier,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    pub proposal_key: ProposalKey,
    pub payer: Address,
    #[serde(default)]
    pub authorizers: Vec<Address>,
    #[serde(default)]
    pub payload_signatures: Vec<SignatureEntry>,
    #[serde(default)]
    pub envelope_signatures: Vec<SignatureEntry>,
}

/// One attached signature. The signer index is not stored; it is derived
/// again from the roles when the document is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub address: Address,
    pub key_index: u32,
    pub signature: String,
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

impl TransactionDocument {
    /// Builds the in-memory transaction, attaching payload signatures
    /// before envelope signatures.
    pub fn to_transaction(&self) -> Result<Transaction> {
        let arguments = self
            .arguments
            .iter()
            .map(serde_json::to_vec)
            .collect::<Result<Vec<_>, _>>()
            .context("failed to encode transaction arguments")?;

        let mut tx = TransactionBuilder::new()
            .script(self.script.clone())
            .arguments(arguments)
            .reference_block_id(self.reference_block_id)
            .gas_limit(self.gas_limit)
            .proposal_key(self.proposal_key)
            .payer(self.payer)
            .authorizers(self.authorizers.clone())
            .build()?;

        for entry in &self.payload_signatures {
            tx.add_payload_signature(entry.address, entry.key_index, entry.decode()?);
        }
        for entry in &self.envelope_signatures {
            tx.add_envelope_signature(entry.address, entry.key_index, entry.decode()?);
        }
        Ok(tx)
    }

    /// Captures a transaction, including any signatures it carries.
    pub fn from_transaction(tx: &Transaction) -> Result<Self> {
        let arguments = tx
            .arguments()
            .iter()
            .map(|raw| serde_json::from_slice(raw))
            .collect::<Result<Vec<Value>, _>>()
            .context("transaction argument is not JSON")?;

        Ok(Self {
            script: tx.script().to_string(),
            arguments,
            reference_block_id: *tx.reference_block_id(),
            gas_limit: tx.gas_limit(),
            proposal_key: *tx.proposal_key(),
            payer: tx.payer(),
            authorizers: tx.authorizers().to_vec(),
            payload_signatures: tx.payload_signatures().iter().map(SignatureEntry::from).collect(),
            envelope_signatures: tx
                .envelope_signatures()
                .iter()
                .map(SignatureEntry::from)
                .collect(),
        })
    }
}

impl SignatureEntry {
    fn decode(&self) -> Result<Vec<u8>> {
        hex::decode(self.signature.trim_start_matches("0x"))
            .with_context(|| format!("signature from {} is not valid hex", self.address))
    }
}

impl From<&TransactionSignature> for SignatureEntry {
    fn from(sig: &TransactionSignature) -> Self {
        Self {
            address: sig.address,
            key_index: sig.key_index,
            signature: hex::encode(&sig.signature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "script": "transaction { execute { log(\"Hello, World!\") } }",
        "arguments": [{ "type": "String", "value": "foo" }],
        "reference_block_id": "f0e4c2f76c58916ec258f246851bea091d14d4247a2fc3e18694461b1816e13b",
        "proposal_key": {
            "address": "0xf8d6e0586b0a20c7",
            "key_index": 0,
            "sequence_number": 42
        },
        "payer": "0xf8d6e0586b0a20c7",
        "authorizers": ["0xf8d6e0586b0a20c7"]
    }"#;

    #[test]
    fn missing_optional_fields_take_defaults() {
        let doc: TransactionDocument = serde_json::from_str(DOCUMENT).unwrap();
        assert_eq!(doc.gas_limit, DEFAULT_GAS_LIMIT);
        assert!(doc.payload_signatures.is_empty());
        assert!(doc.envelope_signatures.is_empty());
    }

    #[test]
    fn arguments_become_compact_json_bytes() {
        let doc: TransactionDocument = serde_json::from_str(DOCUMENT).unwrap();
        let tx = doc.to_transaction().unwrap();
        assert_eq!(
            tx.arguments(),
            &[br#"{"type":"String","value":"foo"}"#.to_vec()]
        );
    }

    #[test]
    fn signatures_survive_a_round_trip() {
        let mut doc: TransactionDocument = serde_json::from_str(DOCUMENT).unwrap();
        doc.envelope_signatures.push(SignatureEntry {
            address: doc.payer,
            key_index: 0,
            signature: "ab".repeat(64),
        });

        let tx = doc.to_transaction().unwrap();
        assert_eq!(tx.envelope_signatures().len(), 1);
        assert_eq!(tx.envelope_signatures()[0].signer_index, 0);

        let back = TransactionDocument::from_transaction(&tx).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn bad_signature_hex_is_reported() {
        let mut doc: TransactionDocument = serde_json::from_str(DOCUMENT).unwrap();
        doc.payload_signatures.push(SignatureEntry {
            address: doc.payer,
            key_index: 0,
            signature: "not hex".into(),
        });
        assert!(doc.to_transaction().is_err());
    }
}
