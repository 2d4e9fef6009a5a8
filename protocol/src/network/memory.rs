//! An in-process access node.
//!
//! Keeps accounts, checks signatures and proposal-key sequence numbers the
//! way the chain does, and reports results through the same
//! [`AccessClient`] interface as a real node. It backs the integration
//! tests and lets the CLI work offline.
//!
//! Two execution modes:
//!
//! - [`ExecutionMode::Immediate`]: a transaction executes the moment it is
//!   accepted.
//! - [`ExecutionMode::Manual`]: accepted transactions wait in a pending
//!   queue until [`InMemoryAccessNode::execute_pending`] or
//!   [`InMemoryAccessNode::drop_pending`] is called. This is how tests keep
//!   several transactions in flight at once.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::{AccessClient, ClientError};
use super::types::{Account, Block, TransactionResult, TransactionStatus};
use crate::config::SEQUENCE_NUMBER_MISMATCH_CODE;
use crate::crypto::{add_domain_tag, sha3_256, verify, PublicKey};
use crate::transaction::{Address, Identifier, Transaction, TransactionSignature};

/// When accepted transactions are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Immediate,
    Manual,
}

#[derive(Debug, Default)]
struct Ledger {
    mode: ExecutionMode,
    height: u64,
    accounts: HashMap<Address, Account>,
    results: HashMap<Identifier, TransactionResult>,
    pending: Vec<(Identifier, Transaction)>,
    sent: Vec<Transaction>,
    fail_next_send: Option<ClientError>,
}

/// In-memory stand-in for an access node.
#[derive(Debug, Default)]
pub struct InMemoryAccessNode {
    ledger: RwLock<Ledger>,
    account_fetches: AtomicUsize,
}

impl InMemoryAccessNode {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            ledger: RwLock::new(Ledger {
                mode,
                ..Ledger::default()
            }),
            account_fetches: AtomicUsize::new(0),
        }
    }

    /// Registers or replaces an account.
    pub fn add_account(&self, account: Account) {
        self.ledger.write().accounts.insert(account.address, account);
    }

    /// Overwrites a key's sequence number, as if some other client had
    /// used it.
    pub fn set_sequence_number(&self, address: Address, key_index: u32, sequence_number: u64) {
        let mut ledger = self.ledger.write();
        if let Some(key) = ledger
            .accounts
            .get_mut(&address)
            .and_then(|a| a.keys.iter_mut().find(|k| k.index == key_index))
        {
            key.sequence_number = sequence_number;
        }
    }

    /// Current on-chain sequence number of a key.
    pub fn sequence_number(&self, address: Address, key_index: u32) -> Option<u64> {
        let ledger = self.ledger.read();
        ledger
            .accounts
            .get(&address)
            .and_then(|a| a.key(key_index))
            .map(|k| k.sequence_number)
    }

    /// Makes the next `send_transaction` fail with `error`.
    pub fn fail_next_send(&self, error: ClientError) {
        self.ledger.write().fail_next_send = Some(error);
    }

    /// Executes every pending transaction in submission order. Returns
    /// their ids.
    pub fn execute_pending(&self) -> Vec<Identifier> {
        let mut ledger = self.ledger.write();
        let pending = std::mem::take(&mut ledger.pending);
        let mut executed = Vec::with_capacity(pending.len());
        for (id, tx) in pending {
            let result = execute(&mut ledger, &tx);
            ledger.results.insert(id, result);
            executed.push(id);
        }
        ledger.height += 1;
        executed
    }

    /// Expires every pending transaction without executing it.
    pub fn drop_pending(&self) -> Vec<Identifier> {
        let mut ledger = self.ledger.write();
        let pending = std::mem::take(&mut ledger.pending);
        pending
            .into_iter()
            .map(|(id, _)| {
                ledger.results.insert(
                    id,
                    TransactionResult {
                        status: TransactionStatus::Expired,
                        error_message: String::new(),
                        events: Vec::new(),
                    },
                );
                id
            })
            .collect()
    }

    /// Wipes transaction history and resets every key's sequence number to
    /// zero, like restarting a local network.
    pub fn reset(&self) {
        let mut ledger = self.ledger.write();
        ledger.results.clear();
        ledger.pending.clear();
        ledger.sent.clear();
        ledger.height = 0;
        for account in ledger.accounts.values_mut() {
            for key in &mut account.keys {
                key.sequence_number = 0;
            }
        }
    }

    /// Number of `account` calls served so far.
    pub fn account_fetches(&self) -> usize {
        self.account_fetches.load(Ordering::SeqCst)
    }

    /// Every transaction accepted so far, in order.
    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.ledger.read().sent.clone()
    }
}

/// Identifier the in-memory node assigns: SHA3-256 of the payment envelope.
pub fn transaction_id(tx: &Transaction) -> Identifier {
    Identifier::new(sha3_256(&tx.payment_envelope_message()))
}

fn execute(ledger: &mut Ledger, tx: &Transaction) -> TransactionResult {
    let proposal = *tx.proposal_key();
    let key = ledger
        .accounts
        .get_mut(&proposal.address)
        .and_then(|a| a.keys.iter_mut().find(|k| k.index == proposal.key_index));

    let error_message = match key {
        Some(key) if key.sequence_number == proposal.sequence_number => {
            key.sequence_number += 1;
            String::new()
        }
        Some(key) => format!(
            "[Error Code: {}] invalid proposal key: public key {} on account {} does not have a valid sequence number, expected {}, got {}",
            SEQUENCE_NUMBER_MISMATCH_CODE,
            proposal.key_index,
            proposal.address,
            key.sequence_number,
            proposal.sequence_number
        ),
        None => format!(
            "[Error Code: 1006] invalid proposal key: public key {} on account {} does not exist",
            proposal.key_index, proposal.address
        ),
    };

    TransactionResult {
        status: TransactionStatus::Sealed,
        error_message,
        events: Vec::new(),
    }
}

fn check_signatures(
    ledger: &Ledger,
    signatures: &[TransactionSignature],
    message: &[u8],
) -> Result<(), ClientError> {
    for signature in signatures {
        let key = ledger
            .accounts
            .get(&signature.address)
            .and_then(|a| a.key(signature.key_index))
            .ok_or_else(|| {
                ClientError::Rejected(format!(
                    "unknown key {} on account {}",
                    signature.key_index, signature.address
                ))
            })?;
        if key.revoked {
            return Err(ClientError::Rejected(format!(
                "key {} on account {} is revoked",
                key.index, signature.address
            )));
        }
        let public_key = PublicKey::from_bytes(key.signature_algorithm, &key.public_key)
            .map_err(|e| ClientError::Rejected(e.to_string()))?;
        if !verify(&public_key, key.hash_algorithm, message, &signature.signature) {
            return Err(ClientError::Rejected(format!(
                "invalid signature from {} key {}",
                signature.address, signature.key_index
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl AccessClient for InMemoryAccessNode {
    async fn latest_block(&self) -> Result<Block, ClientError> {
        let height = self.ledger.read().height;
        Ok(Block {
            id: Identifier::new(sha3_256(&height.to_be_bytes())),
            height,
        })
    }

    async fn account(&self, address: Address) -> Result<Account, ClientError> {
        self.account_fetches.fetch_add(1, Ordering::SeqCst);
        self.ledger
            .read()
            .accounts
            .get(&address)
            .cloned()
            .ok_or(ClientError::AccountNotFound(address))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Identifier, ClientError> {
        let mut ledger = self.ledger.write();
        if let Some(error) = ledger.fail_next_send.take() {
            return Err(error);
        }

        check_signatures(
            &ledger,
            transaction.payload_signatures(),
            &add_domain_tag(&transaction.payload_message()),
        )?;
        check_signatures(
            &ledger,
            transaction.envelope_signatures(),
            &add_domain_tag(&transaction.authorization_envelope_message()),
        )?;
        if !transaction
            .envelope_signatures()
            .iter()
            .any(|s| s.address == transaction.payer())
        {
            return Err(ClientError::Rejected("missing payer signature".into()));
        }

        let id = transaction_id(transaction);
        ledger.sent.push(transaction.clone());
        match ledger.mode {
            ExecutionMode::Immediate => {
                let result = execute(&mut ledger, transaction);
                ledger.results.insert(id, result);
                ledger.height += 1;
            }
            ExecutionMode::Manual => {
                ledger.results.insert(id, TransactionResult::pending());
                ledger.pending.push((id, transaction.clone()));
            }
        }
        Ok(id)
    }

    async fn transaction_result(&self, id: &Identifier) -> Result<TransactionResult, ClientError> {
        Ok(self
            .ledger
            .read()
            .results
            .get(id)
            .cloned()
            .unwrap_or(TransactionResult {
                status: TransactionStatus::Unknown,
                error_message: String::new(),
                events: Vec::new(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{HashAlgorithm, PrivateKey, SignatureAlgorithm};
    use crate::network::types::AccountKey;
    use crate::transaction::{
        sign_transaction, LocalSigner, ProposalKey, TransactionBuilder, TransactionSigner,
    };

    fn setup(mode: ExecutionMode) -> (InMemoryAccessNode, LocalSigner) {
        let address = Address::from_hex("0xf8d6e0586b0a20c7").unwrap();
        let key = PrivateKey::generate(SignatureAlgorithm::EcdsaSecp256k1);
        let node = InMemoryAccessNode::new(mode);
        node.add_account(Account {
            address,
            keys: vec![AccountKey {
                index: 0,
                public_key: key.public_key().as_bytes().to_vec(),
                signature_algorithm: SignatureAlgorithm::EcdsaSecp256k1,
                hash_algorithm: HashAlgorithm::Sha2_256,
                weight: 1000,
                sequence_number: 0,
                revoked: false,
            }],
        });
        let signer = LocalSigner::new(address, 0, key, HashAlgorithm::Sha2_256);
        (node, signer)
    }

    async fn signed(signer: &LocalSigner, sequence_number: u64) -> Transaction {
        let a = signer.address();
        let mut tx = TransactionBuilder::new()
            .script("transaction {}")
            .reference_block_id(Identifier::ZERO)
            .proposal_key(ProposalKey {
                address: a,
                key_index: 0,
                sequence_number,
            })
            .payer(a)
            .authorizer(a)
            .build()
            .unwrap();
        sign_transaction(&mut tx, signer, &[signer], signer)
            .await
            .unwrap();
        tx
    }

    #[tokio::test]
    async fn immediate_mode_advances_sequence() {
        let (node, signer) = setup(ExecutionMode::Immediate);
        let id = node.send_transaction(&signed(&signer, 0).await).await.unwrap();

        let result = node.transaction_result(&id).await.unwrap();
        assert_eq!(result.status, TransactionStatus::Sealed);
        assert!(result.error_message.is_empty());
        assert_eq!(node.sequence_number(signer.address(), 0), Some(1));
    }

    #[tokio::test]
    async fn stale_sequence_reports_mismatch_code() {
        let (node, signer) = setup(ExecutionMode::Immediate);
        let id = node.send_transaction(&signed(&signer, 4).await).await.unwrap();

        let result = node.transaction_result(&id).await.unwrap();
        assert_eq!(result.error_code(), Some(SEQUENCE_NUMBER_MISMATCH_CODE));
        assert_eq!(node.sequence_number(signer.address(), 0), Some(0));
    }

    #[tokio::test]
    async fn manual_mode_holds_until_executed() {
        let (node, signer) = setup(ExecutionMode::Manual);
        let first = node.send_transaction(&signed(&signer, 0).await).await.unwrap();
        let second = node.send_transaction(&signed(&signer, 1).await).await.unwrap();

        assert_eq!(
            node.transaction_result(&first).await.unwrap().status,
            TransactionStatus::Pending
        );
        assert_eq!(node.execute_pending(), vec![first, second]);
        assert!(node.transaction_result(&second).await.unwrap().error_message.is_empty());
        assert_eq!(node.sequence_number(signer.address(), 0), Some(2));
    }

    #[tokio::test]
    async fn drop_pending_expires() {
        let (node, signer) = setup(ExecutionMode::Manual);
        let id = node.send_transaction(&signed(&signer, 0).await).await.unwrap();
        node.drop_pending();
        assert_eq!(
            node.transaction_result(&id).await.unwrap().status,
            TransactionStatus::Expired
        );
    }

    #[tokio::test]
    async fn rejects_tampered_signature() {
        let (node, signer) = setup(ExecutionMode::Immediate);
        let mut tx = signed(&signer, 0).await;
        let original = tx.envelope_signatures()[0].clone();
        let mut forged = original.signature.clone();
        forged[10] ^= 0xFF;
        tx.add_envelope_signature(original.address, original.key_index, forged);

        let err = node.send_transaction(&tx).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        assert!(node.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn injected_failure_is_one_shot() {
        let (node, signer) = setup(ExecutionMode::Immediate);
        node.fail_next_send(ClientError::Transport("connection reset".into()));
        let tx = signed(&signer, 0).await;
        assert!(matches!(
            node.send_transaction(&tx).await,
            Err(ClientError::Transport(_))
        ));
        assert!(node.send_transaction(&tx).await.is_ok());
    }

    #[tokio::test]
    async fn reset_wipes_sequences() {
        let (node, signer) = setup(ExecutionMode::Immediate);
        node.send_transaction(&signed(&signer, 0).await).await.unwrap();
        node.reset();
        assert_eq!(node.sequence_number(signer.address(), 0), Some(0));
        assert!(node.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn counts_account_fetches() {
        let (node, signer) = setup(ExecutionMode::Immediate);
        node.account(signer.address()).await.unwrap();
        node.account(signer.address()).await.unwrap();
        assert_eq!(node.account_fetches(), 2);
    }
}
