//! # Submission Module
//!
//! Sequence-number coordination for transactions sent from the same
//! proposal key.
//!
//! ## Architecture
//!
//! ```text
//! coordinator.rs   SubmissionCoordinator: fetch, sequence, sign, send, monitor
//! sequence.rs      SequenceTracker: cache, recovery set, per-key locks
//! monitor.rs       supervised result monitors with cancellation
//! metrics.rs       prometheus counters for the above
//! ```
//!
//! ## Design Decisions
//!
//! - Sequence state is owned by the coordinator instance, never global.
//! - Every read-modify-write of one key's state runs under that key's async
//!   mutex, so concurrent submissions for a key get distinct, increasing
//!   sequence numbers. Different keys never contend.
//! - Monitors are tracked and cancellable. Shutdown cancels them and waits.
//! - Conflicts are detected asynchronously and absorbed: the submission that
//!   caused one has already returned, so only the next submission for that
//!   key observes it, as a backoff and a fresh account fetch.

pub mod coordinator;
pub mod metrics;
pub mod monitor;
pub mod sequence;

pub use coordinator::{
    ConfigError, CoordinatorConfig, SubmissionCoordinator, SubmissionReceipt, TransactionRequest,
};
pub use metrics::SubmissionMetrics;
pub use monitor::{MonitorHandle, MonitorOutcome};
pub use sequence::SequenceTracker;

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::encoding::EncodingError;
use crate::network::ClientError;
use crate::transaction::{Address, SigningError};

/// Everything `submit` can return.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A field could not be encoded. Nothing was sent.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Unsupported algorithm or unusable key material. Nothing was sent.
    #[error("signing error: {0}")]
    Crypto(#[from] CryptoError),

    /// A signer chose not to sign. Not retryable as-is.
    #[error("authorization declined by {address}")]
    AuthorizationDeclined { address: Address },

    /// The access node could not be reached or refused the request. The
    /// sequence cache was not advanced.
    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("account {address} has no key at index {key_index}")]
    UnknownProposalKey { address: Address, key_index: u32 },

    #[error("key {key_index} on account {address} is revoked")]
    RevokedKey { address: Address, key_index: u32 },
}

impl From<SigningError> for SubmitError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::Declined { address } => Self::AuthorizationDeclined { address },
            SigningError::Crypto(e) => Self::Crypto(e),
        }
    }
}
