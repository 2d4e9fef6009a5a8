//! The submission coordinator.
//!
//! Per proposal key, the coordinator moves through three states:
//!
//! ```text
//!   Clean ──submit──▶ Pipelined ──mismatch reported──▶ Recovering
//!     ▲                                                   │
//!     └────────── backoff, refetch, clear cache ◀─────────┘
//! ```
//!
//! `submit` walks the steps in order:
//!
//! 1. Fetch the latest block and the proposer's account.
//! 2. Under the key's lock: if the key is recovering, back off, refetch the
//!    account, and clear the key's cached state.
//! 3. Pick the sequence number (`cache + 1` while pipelining, else live).
//! 4. Build and sign.
//! 5. Send. A transport failure leaves the cache untouched.
//! 6. Record the issued sequence number.
//! 7. Prune finished monitors and start one for the new transaction.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::metrics::SubmissionMetrics;
use super::monitor::{spawn_monitor, MonitorContext, MonitorHandle, MonitorOutcome};
use super::sequence::SequenceTracker;
use super::SubmitError;
use crate::config::{
    DEFAULT_GAS_LIMIT, MIN_POLL_INTERVAL, MONITOR_OBSERVATION_WINDOW, MONITOR_POLL_INTERVAL,
    RECOVERY_BACKOFF, SEQUENCE_NUMBER_MISMATCH_CODE,
};
use crate::network::{Account, AccessClient, AccountKey, Block};
use crate::transaction::{
    sign_transaction, Address, Identifier, ProposalKey, TransactionBuilder, TransactionSigner,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Coordinator timings.
///
/// Deserializable so a host application can carry it in its own config
/// file; every field falls back to the default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Delay between result polls for one transaction.
    pub poll_interval_ms: u64,
    /// Total time a monitor watches one transaction.
    pub observation_window_ms: u64,
    /// Pause before refreshing a key flagged in conflict.
    pub recovery_backoff_ms: u64,
    /// Execution error code meaning "wrong sequence number".
    pub sequence_mismatch_code: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: MONITOR_POLL_INTERVAL.as_millis() as u64,
            observation_window_ms: MONITOR_OBSERVATION_WINDOW.as_millis() as u64,
            recovery_backoff_ms: RECOVERY_BACKOFF.as_millis() as u64,
            sequence_mismatch_code: SEQUENCE_NUMBER_MISMATCH_CODE,
        }
    }
}

/// A coordinator configuration that cannot be used as given.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

impl CoordinatorConfig {
    /// Checks values a deserialized config may carry but a timer cannot use.
    ///
    /// Coordinators built from an invalid config still run: the monitor
    /// clamps the poll interval to [`MIN_POLL_INTERVAL`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn observation_window(&self) -> Duration {
        Duration::from_millis(self.observation_window_ms)
    }

    pub fn recovery_backoff(&self) -> Duration {
        Duration::from_millis(self.recovery_backoff_ms)
    }
}

// ---------------------------------------------------------------------------
// Request / Receipt
// ---------------------------------------------------------------------------

/// A transaction to submit, with the signers for each role.
///
/// The proposer's address and key index become the proposal key. The
/// coordinator fills in the reference block and sequence number.
#[derive(Clone)]
pub struct TransactionRequest {
    pub script: String,
    pub arguments: Vec<Vec<u8>>,
    pub gas_limit: u64,
    pub proposer: Arc<dyn TransactionSigner>,
    pub payer: Arc<dyn TransactionSigner>,
    pub authorizers: Vec<Arc<dyn TransactionSigner>>,
}

impl TransactionRequest {
    /// A request where one key proposes, pays and authorizes.
    pub fn single_signer(script: impl Into<String>, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            script: script.into(),
            arguments: Vec::new(),
            gas_limit: DEFAULT_GAS_LIMIT,
            proposer: Arc::clone(&signer),
            payer: Arc::clone(&signer),
            authorizers: vec![signer],
        }
    }

    pub fn argument(mut self, argument: impl Into<Vec<u8>>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn payer(mut self, payer: Arc<dyn TransactionSigner>) -> Self {
        self.payer = payer;
        self
    }

    pub fn authorizers(mut self, authorizers: Vec<Arc<dyn TransactionSigner>>) -> Self {
        self.authorizers = authorizers;
        self
    }
}

/// What a successful submission returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub transaction_id: Identifier,
    pub proposal_key: ProposalKey,
    pub reference_block: Block,
}

// ---------------------------------------------------------------------------
// SubmissionCoordinator
// ---------------------------------------------------------------------------

/// Pipelines transactions per proposal key and recovers from sequence
/// conflicts reported by the chain.
///
/// All sequence state is owned by the coordinator. Two coordinators talking
/// to the same chain with the same key will conflict; that is what the
/// recovery path is for, not something it prevents.
pub struct SubmissionCoordinator {
    client: Arc<dyn AccessClient>,
    tracker: Arc<SequenceTracker>,
    monitors: Mutex<Vec<MonitorHandle>>,
    metrics: SubmissionMetrics,
    config: CoordinatorConfig,
}

impl SubmissionCoordinator {
    pub fn new(client: Arc<dyn AccessClient>, config: CoordinatorConfig) -> Self {
        Self::with_metrics(client, config, SubmissionMetrics::new())
    }

    pub fn with_metrics(
        client: Arc<dyn AccessClient>,
        config: CoordinatorConfig,
        metrics: SubmissionMetrics,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, clamped_to = ?MIN_POLL_INTERVAL, "invalid coordinator config");
        }
        Self {
            client,
            tracker: Arc::new(SequenceTracker::new()),
            monitors: Mutex::new(Vec::new()),
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SubmissionMetrics {
        &self.metrics
    }

    pub fn sequence_tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    /// Builds, signs and sends a transaction.
    ///
    /// Errors are returned for everything that goes wrong before or during
    /// sending. A sequence conflict discovered later only affects the next
    /// submission for the same key.
    pub async fn submit(&self, request: TransactionRequest) -> Result<SubmissionReceipt, SubmitError> {
        match self.submit_inner(request).await {
            Ok(receipt) => {
                self.metrics.submissions_accepted_total.inc();
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.submissions_failed_total.inc();
                warn!(error = %e, "submission failed");
                Err(e)
            }
        }
    }

    async fn submit_inner(&self, request: TransactionRequest) -> Result<SubmissionReceipt, SubmitError> {
        let proposer = request.proposer.address();
        let key_index = request.proposer.key_index();

        let reference_block = self
            .client
            .latest_block()
            .await
            .map_err(|source| SubmitError::Transport {
                context: "fetch latest block",
                source,
            })?;
        let mut account = self.fetch_account(proposer).await?;
        let key_id = proposal_key(&account, key_index)?.public_key_hex();

        let guard = self.tracker.lock(&key_id).await;

        if self.tracker.is_recovering(&key_id) {
            info!(
                address = %proposer,
                key_index,
                backoff_ms = self.config.recovery_backoff_ms,
                "proposal key in conflict, refreshing"
            );
            tokio::time::sleep(self.config.recovery_backoff()).await;
            account = self.fetch_account(proposer).await?;
            self.tracker.finish_recovery(&key_id);
            self.metrics.recoveries_total.inc();
        }

        let live = proposal_key(&account, key_index)?.sequence_number;
        let sequence_number = self.tracker.next_sequence(&key_id, live);
        debug!(
            address = %proposer,
            key_index,
            live,
            sequence_number,
            "sequence number chosen"
        );

        let proposal = ProposalKey {
            address: proposer,
            key_index,
            sequence_number,
        };
        let mut transaction = TransactionBuilder::new()
            .script(request.script)
            .arguments(request.arguments)
            .reference_block_id(reference_block.id)
            .gas_limit(request.gas_limit)
            .proposal_key(proposal)
            .payer(request.payer.address())
            .authorizers(request.authorizers.iter().map(|a| a.address()).collect())
            .build()?;

        let authorizers: Vec<&dyn TransactionSigner> =
            request.authorizers.iter().map(|a| &**a).collect();
        sign_transaction(
            &mut transaction,
            &*request.proposer,
            &authorizers,
            &*request.payer,
        )
        .await?;

        let transaction_id = self
            .client
            .send_transaction(&transaction)
            .await
            .map_err(|source| SubmitError::Transport {
                context: "send transaction",
                source,
            })?;

        self.tracker.record_accepted(&key_id, sequence_number);
        drop(guard);

        info!(
            tx_id = %transaction_id,
            address = %proposer,
            key_index,
            sequence_number,
            "transaction accepted"
        );

        self.start_monitor(transaction_id, key_id);

        Ok(SubmissionReceipt {
            transaction_id,
            proposal_key: proposal,
            reference_block,
        })
    }

    /// Forgets all cached sequence numbers and conflict flags.
    ///
    /// Call this after the chain's state is wiped; otherwise every later
    /// submission carries a stale, too-high sequence number. Monitors for
    /// transactions sent before the wipe are cancelled and awaited first,
    /// so none of them can flag a key after the reset.
    pub async fn reset_sequence_tracking(&self) -> Vec<MonitorOutcome> {
        let outcomes = self.cancel_monitors().await;
        self.tracker.reset();
        info!(cancelled_monitors = outcomes.len(), "sequence tracking reset");
        outcomes
    }

    /// Number of monitors still running.
    pub fn active_monitors(&self) -> usize {
        let mut monitors = self.monitors.lock();
        monitors.retain(|m| !m.is_finished());
        monitors.len()
    }

    /// Waits for every running monitor to finish on its own.
    pub async fn join_monitors(&self) -> Vec<MonitorOutcome> {
        let handles = std::mem::take(&mut *self.monitors.lock());
        futures::future::join_all(handles.into_iter().map(MonitorHandle::join)).await
    }

    /// Cancels every running monitor and waits for them to exit.
    pub async fn shutdown(&self) -> Vec<MonitorOutcome> {
        info!(
            monitors = self.monitors.lock().len(),
            "shutting down submission coordinator"
        );
        self.cancel_monitors().await
    }

    async fn cancel_monitors(&self) -> Vec<MonitorOutcome> {
        let handles = std::mem::take(&mut *self.monitors.lock());
        for handle in &handles {
            handle.cancel();
        }
        futures::future::join_all(handles.into_iter().map(MonitorHandle::join)).await
    }

    async fn fetch_account(&self, address: Address) -> Result<Account, SubmitError> {
        self.client
            .account(address)
            .await
            .map_err(|source| SubmitError::Transport {
                context: "fetch proposer account",
                source,
            })
    }

    fn start_monitor(&self, transaction_id: Identifier, key_id: String) {
        let ctx = MonitorContext {
            client: Arc::clone(&self.client),
            tracker: Arc::clone(&self.tracker),
            metrics: self.metrics.clone(),
            poll_interval: self.config.poll_interval(),
            observation_window: self.config.observation_window(),
            mismatch_code: self.config.sequence_mismatch_code,
        };
        let handle = spawn_monitor(ctx, transaction_id, key_id);

        let mut monitors = self.monitors.lock();
        monitors.retain(|m| !m.is_finished());
        monitors.push(handle);
    }
}

fn proposal_key(account: &Account, key_index: u32) -> Result<&AccountKey, SubmitError> {
    let key = account
        .key(key_index)
        .ok_or(SubmitError::UnknownProposalKey {
            address: account.address,
            key_index,
        })?;
    if key.revoked {
        return Err(SubmitError::RevokedKey {
            address: account.address,
            key_index,
        });
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_constants() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_interval(), MONITOR_POLL_INTERVAL);
        assert_eq!(config.observation_window(), MONITOR_OBSERVATION_WINDOW);
        assert_eq!(config.recovery_backoff(), RECOVERY_BACKOFF);
        assert_eq!(config.sequence_mismatch_code, 1007);
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{ "recovery_backoff_ms": 500 }"#).unwrap();
        assert_eq!(config.recovery_backoff(), Duration::from_millis(500));
        assert_eq!(config.poll_interval(), MONITOR_POLL_INTERVAL);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{ "poll_interval_ms": 0 }"#).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));
        assert_eq!(CoordinatorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn revoked_and_missing_keys_are_rejected() {
        use crate::crypto::{HashAlgorithm, SignatureAlgorithm};

        let address = Address::new([1; 8]);
        let account = Account {
            address,
            keys: vec![AccountKey {
                index: 0,
                public_key: vec![0; 64],
                signature_algorithm: SignatureAlgorithm::EcdsaP256,
                hash_algorithm: HashAlgorithm::Sha3_256,
                weight: 1000,
                sequence_number: 0,
                revoked: true,
            }],
        };
        assert!(matches!(
            proposal_key(&account, 0),
            Err(SubmitError::RevokedKey { key_index: 0, .. })
        ));
        assert!(matches!(
            proposal_key(&account, 1),
            Err(SubmitError::UnknownProposalKey { key_index: 1, .. })
        ));
    }
}
