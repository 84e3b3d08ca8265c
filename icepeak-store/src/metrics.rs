//! Store metrics.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Counters and gauges maintained by the store.
///
/// The handles are cheap atomics; cloning shares the underlying values, so
/// the same instance can be registered once and handed to the writer thread.
#[derive(Debug, Default, Clone)]
pub struct StoreMetrics {
    /// Size of the snapshot file in bytes, as of the last sync.
    pub data_size_bytes: Gauge,
    /// Total bytes written to the snapshot file.
    pub data_written_bytes: Counter,
    /// Total bytes appended to the journal.
    pub journal_written_bytes: Counter,
    /// Number of active subscribers.
    pub subscriber_count: Gauge,
    /// Total modifications applied to the in-memory document.
    pub modifications_applied: Counter,
}

impl StoreMetrics {
    /// Create the metrics and register them under the `icepeak` prefix.
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = StoreMetrics::default();
        let sub = registry.sub_registry_with_prefix("icepeak");
        sub.register(
            "data_size_bytes",
            "Size of the snapshot file in bytes as of the last sync",
            metrics.data_size_bytes.clone(),
        );
        sub.register(
            "data_written_bytes",
            "Total bytes written to the snapshot file",
            metrics.data_written_bytes.clone(),
        );
        sub.register(
            "journal_written_bytes",
            "Total bytes appended to the journal",
            metrics.journal_written_bytes.clone(),
        );
        sub.register(
            "subscriber_count",
            "Number of active subscribers",
            metrics.subscriber_count.clone(),
        );
        sub.register(
            "modifications_applied",
            "Total modifications applied to the in-memory document",
            metrics.modifications_applied.clone(),
        );
        metrics
    }
}
