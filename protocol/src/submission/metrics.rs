//! # Submission Metrics
//!
//! Counters for the coordinator, registered in a dedicated
//! [`prometheus::Registry`] so they do not collide with whatever the host
//! application registers globally.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Metric handles for one coordinator.
///
/// Clone-friendly: prometheus handles share their underlying value, so a
/// clone moved into a monitor task updates the same series.
#[derive(Clone)]
pub struct SubmissionMetrics {
    registry: Registry,
    /// Transactions the access node accepted.
    pub submissions_accepted_total: IntCounter,
    /// Submissions that returned an error to the caller.
    pub submissions_failed_total: IntCounter,
    /// Sequence-number mismatches reported by the chain.
    pub sequence_conflicts_total: IntCounter,
    /// Keys refreshed after a conflict.
    pub recoveries_total: IntCounter,
    /// Result monitors currently running.
    pub active_monitors: IntGauge,
}

impl SubmissionMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("flowkit".into()), None)
            .expect("failed to create prometheus registry");

        let submissions_accepted_total = IntCounter::new(
            "submissions_accepted_total",
            "Transactions accepted by the access node",
        )
        .expect("metric creation");
        registry
            .register(Box::new(submissions_accepted_total.clone()))
            .expect("metric registration");

        let submissions_failed_total = IntCounter::new(
            "submissions_failed_total",
            "Submissions that failed before or during sending",
        )
        .expect("metric creation");
        registry
            .register(Box::new(submissions_failed_total.clone()))
            .expect("metric registration");

        let sequence_conflicts_total = IntCounter::new(
            "sequence_conflicts_total",
            "Sequence number mismatches reported by the chain",
        )
        .expect("metric creation");
        registry
            .register(Box::new(sequence_conflicts_total.clone()))
            .expect("metric registration");

        let recoveries_total =
            IntCounter::new("recoveries_total", "Proposal keys refreshed after a conflict")
                .expect("metric creation");
        registry
            .register(Box::new(recoveries_total.clone()))
            .expect("metric registration");

        let active_monitors =
            IntGauge::new("active_monitors", "Result monitors currently running")
                .expect("metric creation");
        registry
            .register(Box::new(active_monitors.clone()))
            .expect("metric registration");

        Self {
            registry,
            submissions_accepted_total,
            submissions_failed_total,
            sequence_conflicts_total,
            recoveries_total,
            active_monitors,
        }
    }

    /// The registry holding these metrics, for merging into an exporter.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for SubmissionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_prefix() {
        let metrics = SubmissionMetrics::new();
        metrics.submissions_accepted_total.inc();
        metrics.active_monitors.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("flowkit_submissions_accepted_total 1"));
        assert!(text.contains("flowkit_active_monitors 2"));
    }

    #[test]
    fn clones_share_series() {
        let metrics = SubmissionMetrics::new();
        let clone = metrics.clone();
        clone.sequence_conflicts_total.inc();
        assert_eq!(metrics.sequence_conflicts_total.get(), 1);
    }
}
