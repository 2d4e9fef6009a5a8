//! The access-node interface the submission path consumes.
//!
//! Transport (HTTP, gRPC) is not this crate's business. Anything that can
//! answer these four questions can drive the coordinator.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use super::types::{Account, Block, TransactionResult};
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::transaction::{Address, Identifier, Transaction};

/// Failures reported by an [`AccessClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("account {0} not found")]
    AccountNotFound(Address),

    #[error("transaction {0} not found")]
    TransactionNotFound(Identifier),

    /// The node refused the transaction outright (malformed, bad signature,
    /// expired reference block).
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Read and submit operations against an access node.
#[async_trait]
pub trait AccessClient: Send + Sync {
    /// Latest sealed block.
    async fn latest_block(&self) -> Result<Block, ClientError>;

    /// Account state, including each key's live sequence number.
    async fn account(&self, address: Address) -> Result<Account, ClientError>;

    /// Submits a fully signed transaction. Acceptance means the node took
    /// it, not that it executed.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Identifier, ClientError>;

    async fn transaction_result(&self, id: &Identifier) -> Result<TransactionResult, ClientError>;
}

// ---------------------------------------------------------------------------
// TimeoutClient
// ---------------------------------------------------------------------------

/// Wraps another client and bounds every request with a timeout.
#[derive(Debug, Clone)]
pub struct TimeoutClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C: AccessClient> TimeoutClient<C> {
    /// Uses [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(inner: C) -> Self {
        Self::with_timeout(inner, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    async fn guarded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>> + Send,
    {
        match timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "access node timeout");
                Err(ClientError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<C: AccessClient> AccessClient for TimeoutClient<C> {
    async fn latest_block(&self) -> Result<Block, ClientError> {
        self.guarded("latest_block", self.inner.latest_block()).await
    }

    async fn account(&self, address: Address) -> Result<Account, ClientError> {
        self.guarded("account", self.inner.account(address)).await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Identifier, ClientError> {
        self.guarded("send_transaction", self.inner.send_transaction(transaction))
            .await
    }

    async fn transaction_result(&self, id: &Identifier) -> Result<TransactionResult, ClientError> {
        self.guarded("transaction_result", self.inner.transaction_result(id))
            .await
    }
}
