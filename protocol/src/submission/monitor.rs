//! Background result monitors.
//!
//! One monitor per accepted transaction. It polls the access node until the
//! transaction settles, the chain reports a sequence mismatch, the
//! observation window closes, or the coordinator cancels it. A mismatch
//! flags the proposal key in the [`SequenceTracker`]; nothing is ever
//! returned to the original caller.

use prometheus::IntGauge;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::metrics::SubmissionMetrics;
use super::sequence::SequenceTracker;
use crate::config::MIN_POLL_INTERVAL;
use crate::network::{AccessClient, TransactionStatus};
use crate::transaction::Identifier;

/// How a monitor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Reached a final status without a sequence mismatch.
    Settled(TransactionStatus),
    /// The chain reported a sequence mismatch; the key is now recovering.
    Conflict,
    /// Nothing conclusive within the observation window.
    WindowElapsed,
    Cancelled,
}

/// Everything a monitor task needs, cloned out of the coordinator.
#[derive(Clone)]
pub(crate) struct MonitorContext {
    pub client: Arc<dyn AccessClient>,
    pub tracker: Arc<SequenceTracker>,
    pub metrics: SubmissionMetrics,
    pub poll_interval: Duration,
    pub observation_window: Duration,
    pub mismatch_code: u32,
}

/// Owner's side of a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    transaction_id: Identifier,
    cancel: watch::Sender<bool>,
    task: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    pub fn transaction_id(&self) -> &Identifier {
        &self.transaction_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Asks the monitor to stop at its next suspension point.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Waits for the monitor to exit.
    pub async fn join(self) -> MonitorOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tx_id = %self.transaction_id, error = %e, "monitor task aborted");
                MonitorOutcome::Cancelled
            }
        }
    }
}

/// One unit of the active-monitor gauge, released when the task's future
/// is dropped: on return, on panic, or on abort.
struct ActiveMonitor(IntGauge);

impl ActiveMonitor {
    fn enter(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for ActiveMonitor {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Starts watching `transaction_id`, which was proposed by `key`.
pub(crate) fn spawn_monitor(
    mut ctx: MonitorContext,
    transaction_id: Identifier,
    key: String,
) -> MonitorHandle {
    ctx.poll_interval = ctx.poll_interval.max(MIN_POLL_INTERVAL);
    let (cancel, cancelled) = watch::channel(false);
    let active = ActiveMonitor::enter(&ctx.metrics.active_monitors);
    let task = tokio::spawn(async move {
        let _active = active;
        let outcome = run(ctx, transaction_id, key, cancelled).await;
        debug!(tx_id = %transaction_id, ?outcome, "monitor exited");
        outcome
    });
    MonitorHandle {
        transaction_id,
        cancel,
        task,
    }
}

async fn run(
    ctx: MonitorContext,
    transaction_id: Identifier,
    key: String,
    mut cancelled: watch::Receiver<bool>,
) -> MonitorOutcome {
    let window = ctx.observation_window;
    tokio::select! {
        biased;
        _ = cancelled.changed() => MonitorOutcome::Cancelled,
        outcome = timeout(window, poll(&ctx, &transaction_id, &key)) => {
            outcome.unwrap_or(MonitorOutcome::WindowElapsed)
        }
    }
}

async fn poll(ctx: &MonitorContext, transaction_id: &Identifier, key: &str) -> MonitorOutcome {
    let mut ticker = interval(ctx.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; a fresh transaction has no
    // result yet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let result = match ctx.client.transaction_result(transaction_id).await {
            Ok(result) => result,
            Err(e) => {
                debug!(tx_id = %transaction_id, error = %e, "result poll failed");
                continue;
            }
        };

        if result.is_sequence_mismatch(ctx.mismatch_code) {
            warn!(
                tx_id = %transaction_id,
                error = %result.error_message,
                "sequence number conflict, key flagged for recovery"
            );
            ctx.metrics.sequence_conflicts_total.inc();
            ctx.tracker.mark_conflict(key);
            return MonitorOutcome::Conflict;
        }
        if result.status.is_final() {
            info!(tx_id = %transaction_id, status = ?result.status, "transaction settled");
            return MonitorOutcome::Settled(result.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Account, Block, ClientError, TransactionResult};
    use crate::transaction::{Address, Transaction};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "key";

    /// Answers every result query with `reply`, counting the calls.
    struct ResultSource {
        reply: fn() -> Result<TransactionResult, ClientError>,
        polls: AtomicUsize,
    }

    impl ResultSource {
        fn new(reply: fn() -> Result<TransactionResult, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                polls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AccessClient for ResultSource {
        async fn latest_block(&self) -> Result<Block, ClientError> {
            Err(ClientError::Transport("unused".into()))
        }

        async fn account(&self, address: Address) -> Result<Account, ClientError> {
            Err(ClientError::AccountNotFound(address))
        }

        async fn send_transaction(&self, _: &Transaction) -> Result<Identifier, ClientError> {
            Err(ClientError::Transport("unused".into()))
        }

        async fn transaction_result(&self, _: &Identifier) -> Result<TransactionResult, ClientError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            (self.reply)()
        }
    }

    fn context(client: Arc<ResultSource>, poll_interval: Duration) -> MonitorContext {
        MonitorContext {
            client,
            tracker: Arc::new(SequenceTracker::new()),
            metrics: SubmissionMetrics::new(),
            poll_interval,
            observation_window: Duration::from_secs(10),
            mismatch_code: 1007,
        }
    }

    fn sealed() -> Result<TransactionResult, ClientError> {
        Ok(TransactionResult {
            status: TransactionStatus::Sealed,
            error_message: String::new(),
            events: vec![],
        })
    }

    #[tokio::test(start_paused = true)]
    async fn failing_polls_are_absorbed_until_window_closes() {
        let client = ResultSource::new(|| Err(ClientError::Transport("connection refused".into())));
        let ctx = context(Arc::clone(&client), Duration::from_secs(1));
        let tracker = Arc::clone(&ctx.tracker);
        let metrics = ctx.metrics.clone();

        let handle = spawn_monitor(ctx, Identifier::ZERO, KEY.into());
        assert_eq!(metrics.active_monitors.get(), 1);

        assert_eq!(handle.join().await, MonitorOutcome::WindowElapsed);
        assert!(client.polls.load(Ordering::SeqCst) >= 5);
        assert!(!tracker.is_recovering(KEY));
        assert_eq!(metrics.sequence_conflicts_total.get(), 0);
        assert_eq!(metrics.active_monitors.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_poll_interval_still_polls() {
        let client = ResultSource::new(sealed);
        let ctx = context(Arc::clone(&client), Duration::ZERO);
        let metrics = ctx.metrics.clone();

        let handle = spawn_monitor(ctx, Identifier::ZERO, KEY.into());
        assert_eq!(
            handle.join().await,
            MonitorOutcome::Settled(TransactionStatus::Sealed)
        );
        assert_eq!(client.polls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.active_monitors.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn mismatch_flags_the_key() {
        let client = ResultSource::new(|| {
            Ok(TransactionResult {
                status: TransactionStatus::Sealed,
                error_message: "[Error Code: 1007] invalid proposal key".into(),
                events: vec![],
            })
        });
        let ctx = context(client, Duration::from_secs(1));
        let tracker = Arc::clone(&ctx.tracker);

        let handle = spawn_monitor(ctx, Identifier::ZERO, KEY.into());
        assert_eq!(handle.join().await, MonitorOutcome::Conflict);
        assert!(tracker.is_recovering(KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn gauge_is_released_when_the_task_panics() {
        let client = ResultSource::new(|| panic!("client bug"));
        let ctx = context(client, Duration::from_secs(1));
        let metrics = ctx.metrics.clone();

        let handle = spawn_monitor(ctx, Identifier::ZERO, KEY.into());
        assert_eq!(handle.join().await, MonitorOutcome::Cancelled);
        assert_eq!(metrics.active_monitors.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_a_pending_monitor() {
        let client = ResultSource::new(|| Ok(TransactionResult::pending()));
        let ctx = context(client, Duration::from_secs(1));
        let metrics = ctx.metrics.clone();

        let handle = spawn_monitor(ctx, Identifier::ZERO, KEY.into());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!handle.is_finished());

        handle.cancel();
        assert_eq!(handle.join().await, MonitorOutcome::Cancelled);
        assert_eq!(metrics.active_monitors.get(), 0);
    }
}
