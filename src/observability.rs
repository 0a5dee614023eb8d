//! Tracing setup and in-process counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins over the configured filter when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording pipeline counters
#[derive(Debug, Default)]
pub struct Metrics {
    slices_stored: AtomicU64,
    slices_skipped: AtomicU64,
    danger_written: AtomicU64,
    records_pruned: AtomicU64,
    stage_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slices_stored(&self, count: usize) {
        self.slices_stored.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "slices_stored", count, "Metric incremented");
    }

    pub fn slices_skipped(&self, count: usize) {
        self.slices_skipped.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "slices_skipped", count, "Metric incremented");
    }

    pub fn danger_written(&self, count: usize) {
        self.danger_written.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "danger_written", count, "Metric incremented");
    }

    pub fn records_pruned(&self, count: usize) {
        self.records_pruned.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "records_pruned", count, "Metric incremented");
    }

    pub fn stage_failed(&self) {
        self.stage_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "stage_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            slices_stored: self.slices_stored.load(Ordering::Relaxed),
            slices_skipped: self.slices_skipped.load(Ordering::Relaxed),
            danger_written: self.danger_written.load(Ordering::Relaxed),
            records_pruned: self.records_pruned.load(Ordering::Relaxed),
            stage_failures: self.stage_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub slices_stored: u64,
    pub slices_skipped: u64,
    pub danger_written: u64,
    pub records_pruned: u64,
    pub stage_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.slices_stored(3);
        metrics.slices_stored(2);
        metrics.slices_skipped(1);
        metrics.danger_written(4);
        metrics.records_pruned(7);
        metrics.stage_failed();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                slices_stored: 5,
                slices_skipped: 1,
                danger_written: 4,
                records_pruned: 7,
                stage_failures: 1,
            }
        );
    }
}
