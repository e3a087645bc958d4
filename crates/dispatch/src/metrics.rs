//! Dispatch metrics
//!
//! Atomic counters shared by the ingest path and every worker. Besides
//! logging, this is the only cross-worker mutable state in the engine.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the dispatch subsystem
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Jobs accepted onto a queue
    jobs_enqueued: AtomicU64,

    /// Jobs the notifier reported as delivered
    jobs_delivered: AtomicU64,

    /// Delivery attempts that failed (including timeouts and panics)
    jobs_failed: AtomicU64,

    /// Jobs re-enqueued for another attempt
    jobs_retried: AtomicU64,

    /// Jobs handed to the failover targets
    jobs_failed_over: AtomicU64,

    /// Jobs evicted by drop-oldest on a full queue
    jobs_dropped_capacity: AtomicU64,

    /// Jobs abandoned when the grace period expired at shutdown
    jobs_dropped_shutdown: AtomicU64,

    /// Failover jobs discarded after failing themselves
    jobs_dropped_failover: AtomicU64,
}

impl DispatchMetrics {
    /// Create a zeroed metrics instance
    pub const fn new() -> Self {
        Self {
            jobs_enqueued: AtomicU64::new(0),
            jobs_delivered: AtomicU64::new(0),
            jobs_failed: AtomicU64::new(0),
            jobs_retried: AtomicU64::new(0),
            jobs_failed_over: AtomicU64::new(0),
            jobs_dropped_capacity: AtomicU64::new(0),
            jobs_dropped_shutdown: AtomicU64::new(0),
            jobs_dropped_failover: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.jobs_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delivered(&self) {
        self.jobs_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retried(&self) {
        self.jobs_retried.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failed_over(&self) {
        self.jobs_failed_over.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped_capacity(&self) {
        self.jobs_dropped_capacity.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped_shutdown(&self, count: u64) {
        self.jobs_dropped_shutdown.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped_failover(&self) {
        self.jobs_dropped_failover.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            jobs_enqueued: self.jobs_enqueued.load(Ordering::Relaxed),
            jobs_delivered: self.jobs_delivered.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            jobs_retried: self.jobs_retried.load(Ordering::Relaxed),
            jobs_failed_over: self.jobs_failed_over.load(Ordering::Relaxed),
            jobs_dropped_capacity: self.jobs_dropped_capacity.load(Ordering::Relaxed),
            jobs_dropped_shutdown: self.jobs_dropped_shutdown.load(Ordering::Relaxed),
            jobs_dropped_failover: self.jobs_dropped_failover.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub jobs_enqueued: u64,
    pub jobs_delivered: u64,
    pub jobs_failed: u64,
    pub jobs_retried: u64,
    pub jobs_failed_over: u64,
    pub jobs_dropped_capacity: u64,
    pub jobs_dropped_shutdown: u64,
    pub jobs_dropped_failover: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = DispatchMetrics::new();
        metrics.record_enqueued();
        metrics.record_enqueued();
        metrics.record_delivered();
        metrics.record_failed();
        metrics.record_dropped_shutdown(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_enqueued, 2);
        assert_eq!(snapshot.jobs_delivered, 1);
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.jobs_dropped_shutdown, 3);
        assert_eq!(snapshot.jobs_retried, 0);
    }
}
