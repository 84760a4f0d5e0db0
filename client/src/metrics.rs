//! Prometheus metrics for the broadcast client.
//!
//! [`ClientMetrics`] owns a dedicated [`Registry`] so an embedding process can
//! expose it next to its own metrics.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

pub struct ClientMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Transactions accepted by the corechain mempool check.
    pub broadcasts_submitted: IntCounter,
    /// Broadcast attempts that failed or were rejected.
    pub broadcasts_failed: IntCounter,
    /// Times the cached account sequence was corrected from a mismatch error.
    pub sequence_resets: IntCounter,
    /// Votes skipped because the observer had already voted on the ballot.
    pub votes_skipped: IntCounter,
    /// Votes resent with a higher gas limit after running out of gas.
    pub out_of_gas_resubmissions: IntCounter,
    /// Vote monitors that gave up without reading a result.
    pub monitor_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Messages waiting in the batching pool.
    pub pooled_messages: IntGauge,
}

impl ClientMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let broadcasts_submitted = register_int_counter_with_registry!(
            Opts::new(
                "corelink_broadcasts_submitted_total",
                "Transactions accepted by the corechain mempool check"
            ),
            registry
        )
        .expect("failed to register broadcasts_submitted counter");

        let broadcasts_failed = register_int_counter_with_registry!(
            Opts::new(
                "corelink_broadcasts_failed_total",
                "Broadcast attempts that failed or were rejected"
            ),
            registry
        )
        .expect("failed to register broadcasts_failed counter");

        let sequence_resets = register_int_counter_with_registry!(
            Opts::new(
                "corelink_sequence_resets_total",
                "Account sequence corrections after a mismatch"
            ),
            registry
        )
        .expect("failed to register sequence_resets counter");

        let votes_skipped = register_int_counter_with_registry!(
            Opts::new(
                "corelink_votes_skipped_total",
                "Votes skipped because the ballot already has this observer's vote"
            ),
            registry
        )
        .expect("failed to register votes_skipped counter");

        let out_of_gas_resubmissions = register_int_counter_with_registry!(
            Opts::new(
                "corelink_out_of_gas_resubmissions_total",
                "Votes resent with a higher gas limit"
            ),
            registry
        )
        .expect("failed to register out_of_gas_resubmissions counter");

        let monitor_failures = register_int_counter_with_registry!(
            Opts::new(
                "corelink_monitor_failures_total",
                "Vote monitors that could not read a result"
            ),
            registry
        )
        .expect("failed to register monitor_failures counter");

        let pooled_messages = register_int_gauge_with_registry!(
            Opts::new(
                "corelink_pooled_messages",
                "Messages waiting in the batching pool"
            ),
            registry
        )
        .expect("failed to register pooled_messages gauge");

        Self {
            registry,
            broadcasts_submitted,
            broadcasts_failed,
            sequence_resets,
            votes_skipped,
            out_of_gas_resubmissions,
            monitor_failures,
            pooled_messages,
        }
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_registered() {
        let metrics = ClientMetrics::new();
        metrics.broadcasts_submitted.inc();
        metrics.pooled_messages.set(3);
        let families = metrics.registry.gather();
        assert_eq!(families.len(), 7);
        assert!(families
            .iter()
            .any(|f| f.get_name() == "corelink_broadcasts_submitted_total"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = ClientMetrics::new();
        let b = ClientMetrics::new();
        a.votes_skipped.inc();
        assert_eq!(a.votes_skipped.get(), 1);
        assert_eq!(b.votes_skipped.get(), 0);
    }
}
