//! Tracing setup and refresh counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warmcache=info";

/// Install the global fmt subscriber (`RUST_LOG` overrides the default filter)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Counters shared by the scheduler, its workers and the admin API
#[derive(Debug, Default)]
pub struct Metrics {
    cycles_completed: AtomicU64,
    targets_refreshed: AtomicU64,
    fetch_failures: AtomicU64,
    store_failures: AtomicU64,
    enumeration_failures: AtomicU64,
    signals_received: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_completed(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "cycles_completed", "Metric incremented");
    }

    pub fn target_refreshed(&self) {
        self.targets_refreshed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fetch_failures", "Metric incremented");
    }

    pub fn store_failed(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "store_failures", "Metric incremented");
    }

    pub fn enumeration_failed(&self) {
        self.enumeration_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "enumeration_failures", "Metric incremented");
    }

    pub fn signal_received(&self) {
        self.signals_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            targets_refreshed: self.targets_refreshed.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            enumeration_failures: self.enumeration_failures.load(Ordering::Relaxed),
            signals_received: self.signals_received.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_completed: u64,
    pub targets_refreshed: u64,
    pub fetch_failures: u64,
    pub store_failures: u64,
    pub enumeration_failures: u64,
    pub signals_received: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = Metrics::new();
        metrics.target_refreshed();
        metrics.target_refreshed();
        metrics.fetch_failed();
        metrics.cycle_completed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.targets_refreshed, 2);
        assert_eq!(snapshot.fetch_failures, 1);
        assert_eq!(snapshot.cycles_completed, 1);
        assert_eq!(snapshot.store_failures, 0);
    }
}
