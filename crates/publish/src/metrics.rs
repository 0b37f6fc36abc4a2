//! Destination metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single destination
#[derive(Debug, Default)]
pub struct DestinationMetrics {
    /// Dispatches started (destination enabled)
    attempts: AtomicU64,
    /// Dispatches where every group was delivered
    delivered: AtomicU64,
    /// Dispatches with at least one failed group
    failed: AtomicU64,
    /// Dispatches given up on cancellation or deadline
    cancelled: AtomicU64,
    /// Dispatches skipped because the destination was disabled
    skipped: AtomicU64,
}

impl DestinationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn inc_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn inc_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts(),
            delivered: self.delivered(),
            failed: self.failed(),
            cancelled: self.cancelled(),
            skipped: self.skipped(),
        }
    }
}

/// Snapshot of destination metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub delivered: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = DestinationMetrics::new();
        metrics.inc_attempts();
        metrics.inc_attempts();
        metrics.inc_delivered();
        metrics.inc_failed();
        metrics.inc_skipped();

        let snap = metrics.snapshot();
        assert_eq!(snap.attempts, 2);
        assert_eq!(snap.delivered, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.cancelled, 0);
        assert_eq!(snap.skipped, 1);
    }
}
