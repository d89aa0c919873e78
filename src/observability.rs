//! Observability: tracing setup and request counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // a subscriber may already be installed (tests, embedding apps)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    requests_started: AtomicU64,
    requests_failed: AtomicU64,
    error_responses: AtomicU64,
    searches_issued: AtomicU64,
    stale_results_discarded: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_started(&self) {
        self.requests_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "requests_started", "Metric incremented");
    }

    /// Transport-level failure (no HTTP response)
    pub fn request_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_failed", "Metric incremented");
    }

    /// Response normalized into an error document
    pub fn error_response(&self) {
        self.error_responses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "error_responses", "Metric incremented");
    }

    pub fn search_issued(&self) {
        self.searches_issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "searches_issued", "Metric incremented");
    }

    pub fn stale_result_discarded(&self) {
        self.stale_results_discarded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "stale_results_discarded", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_started: self.requests_started.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            error_responses: self.error_responses.load(Ordering::Relaxed),
            searches_issued: self.searches_issued.load(Ordering::Relaxed),
            stale_results_discarded: self.stale_results_discarded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_started: u64,
    pub requests_failed: u64,
    pub error_responses: u64,
    pub searches_issued: u64,
    pub stale_results_discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = Metrics::new();
        metrics.request_started();
        metrics.request_started();
        metrics.request_failed();
        metrics.search_issued();
        metrics.stale_result_discarded();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_started, 2);
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.error_responses, 0);
        assert_eq!(snapshot.searches_issued, 1);
        assert_eq!(snapshot.stale_results_discarded, 1);
    }
}
