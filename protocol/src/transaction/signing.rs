//! Role-based transaction signing.
//!
//! Who signs what:
//!
//! - Every proposer or authorizer key whose account is **not** the payer
//!   signs the domain-tagged *payload*.
//! - The payer, plus any proposer or authorizer key that belongs to the
//!   payer account, signs the domain-tagged *authorization envelope*.
//!
//! Each distinct (address, key index) signs once. Payload signatures are
//! collected first because the envelope covers them.
//!
//! Signing goes through the [`TransactionSigner`] trait so the key can live
//! anywhere: in memory, in a wallet, behind a remote service. A signer may
//! decline by returning `Ok(None)`, which aborts signing with
//! [`SigningError::Declined`].

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::builder::Transaction;
use super::types::Address;
use crate::crypto::{add_domain_tag, sign, CryptoError, HashAlgorithm, PrivateKey};

/// Something that can produce a signature for one account key.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Account the key belongs to.
    fn address(&self) -> Address;

    /// Index of the key on that account.
    fn key_index(&self) -> u32;

    /// Signs an already domain-tagged message.
    ///
    /// `Ok(None)` means the holder declined.
    async fn sign(&self, message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError>;
}

/// Errors from [`sign_transaction`] and friends.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signer {address} declined to sign")]
    Declined { address: Address },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

// ---------------------------------------------------------------------------
// LocalSigner
// ---------------------------------------------------------------------------

/// A signer backed by an in-memory private key.
#[derive(Clone)]
pub struct LocalSigner {
    address: Address,
    key_index: u32,
    private_key: PrivateKey,
    hash_algorithm: HashAlgorithm,
}

impl LocalSigner {
    pub fn new(
        address: Address,
        key_index: u32,
        private_key: PrivateKey,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            address,
            key_index,
            private_key,
            hash_algorithm,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .field("key_index", &self.key_index)
            .field("algorithm", &self.private_key.algorithm())
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}

#[async_trait]
impl TransactionSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn key_index(&self) -> u32 {
        self.key_index
    }

    async fn sign(&self, message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
        let signature = sign(&self.private_key, self.hash_algorithm, message)?;
        Ok(Some(signature.to_vec()))
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Signs the tagged payload with `signer` and attaches the result.
pub async fn sign_payload(
    tx: &mut Transaction,
    signer: &dyn TransactionSigner,
) -> Result<(), SigningError> {
    let message = add_domain_tag(&tx.payload_message());
    let signature = request(signer, &message).await?;
    tx.add_payload_signature(signer.address(), signer.key_index(), signature);
    Ok(())
}

/// Signs the tagged authorization envelope with `signer` and attaches the
/// result.
pub async fn sign_envelope(
    tx: &mut Transaction,
    signer: &dyn TransactionSigner,
) -> Result<(), SigningError> {
    let message = add_domain_tag(&tx.authorization_envelope_message());
    let signature = request(signer, &message).await?;
    tx.add_envelope_signature(signer.address(), signer.key_index(), signature);
    Ok(())
}

/// Collects every signature the transaction needs, in role order.
///
/// `payer` must sign for the transaction's payer address. Proposer and
/// authorizer keys on the payer account are moved to the envelope round.
pub async fn sign_transaction(
    tx: &mut Transaction,
    proposer: &dyn TransactionSigner,
    authorizers: &[&dyn TransactionSigner],
    payer: &dyn TransactionSigner,
) -> Result<(), SigningError> {
    let payer_address = tx.payer();
    let mut payload_round: Vec<&dyn TransactionSigner> = Vec::new();
    let mut envelope_round: Vec<&dyn TransactionSigner> = Vec::new();

    for signer in std::iter::once(proposer).chain(authorizers.iter().copied()) {
        let round = if signer.address() == payer_address {
            &mut envelope_round
        } else {
            &mut payload_round
        };
        push_unique(round, signer);
    }
    push_unique(&mut envelope_round, payer);

    for signer in payload_round {
        sign_payload(tx, signer).await?;
    }
    for signer in envelope_round {
        sign_envelope(tx, signer).await?;
    }
    Ok(())
}

fn push_unique<'a>(round: &mut Vec<&'a dyn TransactionSigner>, signer: &'a dyn TransactionSigner) {
    let seen = round
        .iter()
        .any(|s| s.address() == signer.address() && s.key_index() == signer.key_index());
    if !seen {
        round.push(signer);
    }
}

async fn request(signer: &dyn TransactionSigner, message: &[u8]) -> Result<Vec<u8>, SigningError> {
    match signer.sign(message).await? {
        Some(signature) => {
            debug!(
                address = %signer.address(),
                key_index = signer.key_index(),
                "signature collected"
            );
            Ok(signature)
        }
        None => Err(SigningError::Declined {
            address: signer.address(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{transaction_domain_tag, verify, SignatureAlgorithm};
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::types::{Identifier, ProposalKey};

    struct Refuses(Address);

    #[async_trait]
    impl TransactionSigner for Refuses {
        fn address(&self) -> Address {
            self.0
        }

        fn key_index(&self) -> u32 {
            0
        }

        async fn sign(&self, _message: &[u8]) -> Result<Option<Vec<u8>>, CryptoError> {
            Ok(None)
        }
    }

    fn addr(n: u8) -> Address {
        Address::new([0, 0, 0, 0, 0, 0, 0, n])
    }

    fn local(address: Address, key_index: u32) -> LocalSigner {
        LocalSigner::new(
            address,
            key_index,
            PrivateKey::generate(SignatureAlgorithm::EcdsaP256),
            HashAlgorithm::Sha3_256,
        )
    }

    fn tx(proposer: Address, payer: Address, authorizers: Vec<Address>) -> Transaction {
        TransactionBuilder::new()
            .script("transaction { prepare(acct: AuthAccount) {} }")
            .reference_block_id(Identifier::ZERO)
            .proposal_key(ProposalKey {
                address: proposer,
                key_index: 0,
                sequence_number: 1,
            })
            .payer(payer)
            .authorizers(authorizers)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn single_account_signs_envelope_only() {
        let a = addr(1);
        let signer = local(a, 0);
        let mut t = tx(a, a, vec![a]);

        sign_transaction(&mut t, &signer, &[&signer], &signer)
            .await
            .unwrap();

        assert!(t.payload_signatures().is_empty());
        assert_eq!(t.envelope_signatures().len(), 1);

        let message = add_domain_tag(&t.authorization_envelope_message());
        assert_eq!(&message[..32], &transaction_domain_tag());
        let public_key = signer.private_key().public_key();
        assert!(verify(
            &public_key,
            HashAlgorithm::Sha3_256,
            &message,
            &t.envelope_signatures()[0].signature
        ));
    }

    #[tokio::test]
    async fn distinct_payer_signs_over_payload_signatures() {
        let proposer = local(addr(1), 0);
        let payer = local(addr(2), 0);
        let mut t = tx(addr(1), addr(2), vec![addr(1)]);

        sign_transaction(&mut t, &proposer, &[&proposer], &payer)
            .await
            .unwrap();

        assert_eq!(t.payload_signatures().len(), 1);
        assert_eq!(t.payload_signatures()[0].signer_index, 0);
        assert_eq!(t.envelope_signatures().len(), 1);
        assert_eq!(t.envelope_signatures()[0].signer_index, 1);

        let payload = add_domain_tag(&t.payload_message());
        assert!(verify(
            &proposer.private_key().public_key(),
            HashAlgorithm::Sha3_256,
            &payload,
            &t.payload_signatures()[0].signature
        ));
        // The envelope signature covers the payload signature just added.
        let envelope = add_domain_tag(&t.authorization_envelope_message());
        assert!(verify(
            &payer.private_key().public_key(),
            HashAlgorithm::Sha3_256,
            &envelope,
            &t.envelope_signatures()[0].signature
        ));
    }

    #[tokio::test]
    async fn proposer_key_on_payer_account_moves_to_envelope() {
        let payer = local(addr(2), 0);
        let proposer = local(addr(2), 1);
        let authorizer = local(addr(3), 0);
        let mut t = tx(addr(2), addr(2), vec![addr(3)]);

        sign_transaction(&mut t, &proposer, &[&authorizer], &payer)
            .await
            .unwrap();

        assert_eq!(t.payload_signatures().len(), 1);
        assert_eq!(t.payload_signatures()[0].address, addr(3));
        let keys: Vec<u32> = t.envelope_signatures().iter().map(|s| s.key_index).collect();
        assert_eq!(keys, vec![0, 1]);
    }

    #[tokio::test]
    async fn declining_payer_aborts() {
        let proposer = local(addr(1), 0);
        let payer = Refuses(addr(2));
        let mut t = tx(addr(1), addr(2), vec![]);

        let err = sign_transaction(&mut t, &proposer, &[], &payer)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::Declined { address } if address == addr(2)));
        assert!(t.envelope_signatures().is_empty());
    }

    #[test]
    fn debug_hides_key_material() {
        let signer = local(addr(1), 0);
        let hex_key = hex::encode(signer.private_key().to_bytes());
        assert!(!format!("{:?}", signer).contains(&hex_key));
    }
}
