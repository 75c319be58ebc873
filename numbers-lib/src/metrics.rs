use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::Serialize;
#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// A snapshot of the service metrics.
/// This structure contains a copy of all metric counters as simple u64 values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct NumbersMetricsSnapshot {
    /// Number of `/numbers` requests received
    pub requests: u64,
    /// Number of requests answered with a window report
    pub successes: u64,
    /// Number of requests rejected for an unknown number type
    pub validation_failures: u64,
    /// Number of requests failed by the upstream
    pub upstream_failures: u64,
    /// Numbers returned by the upstream, duplicates included
    pub numbers_received: u64,
    /// Numbers actually appended to the window
    pub numbers_ingested: u64,
    /// Window length after the latest ingestion
    pub window_len: u64,
}

impl Display for NumbersMetricsSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Numbers Metrics Snapshot:")?;
        writeln!(f, "  Requests: {}", self.requests)?;
        writeln!(f, "  Successes: {}", self.successes)?;
        writeln!(f, "  Validation failures: {}", self.validation_failures)?;
        writeln!(f, "  Upstream failures: {}", self.upstream_failures)?;
        writeln!(f, "  Numbers received: {}", self.numbers_received)?;
        writeln!(f, "  Numbers ingested: {}", self.numbers_ingested)?;
        writeln!(f, "  Window length: {}", self.window_len)
    }
}

/// Atomic counters updated by the request handler
#[derive(Debug)]
pub struct NumbersMetrics {
    requests: AtomicU64,
    successes: AtomicU64,
    validation_failures: AtomicU64,
    upstream_failures: AtomicU64,
    numbers_received: AtomicU64,
    numbers_ingested: AtomicU64,
    window_len: AtomicU64,
}

impl NumbersMetrics {
    /// Create a new metrics instance with all counters initialized to zero
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
            numbers_received: AtomicU64::new(0),
            numbers_ingested: AtomicU64::new(0),
            window_len: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> NumbersMetricsSnapshot {
        NumbersMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            numbers_received: self.numbers_received.load(Ordering::Relaxed),
            numbers_ingested: self.numbers_ingested.load(Ordering::Relaxed),
            window_len: self.window_len.load(Ordering::Relaxed),
        }
    }

    pub fn increment_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_successes(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_upstream_failures(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_numbers_received(&self, count: u64) {
        self.numbers_received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_numbers_ingested(&self, count: u64) {
        self.numbers_ingested.fetch_add(count, Ordering::Relaxed);
    }

    /// Set window length
    pub fn set_window_len(&self, len: u64) {
        self.window_len.store(len, Ordering::Relaxed);
    }
}

impl Default for NumbersMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics instance wrapped in Arc for use across request handlers
pub type SharedMetrics = Arc<NumbersMetrics>;

pub fn create_shared_metrics() -> SharedMetrics {
    Arc::new(NumbersMetrics::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = NumbersMetrics::new();
        metrics.increment_requests();
        metrics.increment_requests();
        metrics.increment_successes();
        metrics.increment_upstream_failures();
        metrics.add_numbers_received(5);
        metrics.add_numbers_ingested(3);
        metrics.set_window_len(3);

        assert_eq!(
            metrics.snapshot(),
            NumbersMetricsSnapshot {
                requests: 2,
                successes: 1,
                validation_failures: 0,
                upstream_failures: 1,
                numbers_received: 5,
                numbers_ingested: 3,
                window_len: 3,
            }
        );
    }

    #[test]
    fn test_display_lists_every_counter() {
        let rendered = NumbersMetrics::new().snapshot().to_string();
        assert_eq!(rendered.lines().count(), 8);
        assert!(rendered.contains("Window length: 0"));
    }
}
