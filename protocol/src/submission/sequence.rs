//! Per-key sequence-number bookkeeping.
//!
//! Keys are identified by their hex-encoded public key, so the same key
//! registered on two accounts is tracked once.
//!
//! The tracker holds three things:
//!
//! - the **cache**: the last sequence number this process issued for a key,
//!   which may be ahead of what the chain has observed;
//! - the **recovery set**: keys the chain has reported in conflict;
//! - a **lock** per key, held by a submission from the recovery check until
//!   the cache is updated.
//!
//! The recovery set is written by result monitors without taking the key
//! lock. A submission only reads it while holding the lock, so a conflict
//! flagged mid-submission is picked up by the next one.

use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct SequenceTracker {
    cache: DashMap<String, u64>,
    recovering: DashSet<String>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(key.to_owned()).or_default().clone();
        lock.lock_owned().await
    }

    /// Sequence number the next transaction for `key` should carry, given
    /// the chain's current value.
    ///
    /// If this process has already issued `live` or later, the previous
    /// transaction is assumed to still be in flight and the next number is
    /// used. Otherwise the chain is ahead (or nothing is cached) and `live`
    /// wins.
    pub fn next_sequence(&self, key: &str, live: u64) -> u64 {
        match self.cache.get(key).map(|cached| *cached) {
            Some(cached) if cached >= live => cached.saturating_add(1),
            _ => live,
        }
    }

    /// Records that a transaction carrying `sequence_number` was accepted.
    pub fn record_accepted(&self, key: &str, sequence_number: u64) {
        self.cache.insert(key.to_owned(), sequence_number);
    }

    /// Last sequence number issued for `key`, if any.
    pub fn cached(&self, key: &str) -> Option<u64> {
        self.cache.get(key).map(|cached| *cached)
    }

    /// Flags `key` as in conflict. Returns `false` if it already was.
    pub fn mark_conflict(&self, key: &str) -> bool {
        self.recovering.insert(key.to_owned())
    }

    pub fn is_recovering(&self, key: &str) -> bool {
        self.recovering.contains(key)
    }

    /// Clears the conflict flag and the cached value for `key`.
    pub fn finish_recovery(&self, key: &str) {
        self.recovering.remove(key);
        self.cache.remove(key);
    }

    /// Forgets every cached value and conflict flag, and drops the locks
    /// no submission currently holds or waits on.
    pub fn reset(&self) {
        self.cache.clear();
        self.recovering.clear();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
