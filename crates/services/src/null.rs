//! Null notifier - discards all jobs
//!
//! Counts what it receives and reports success. Useful for benchmarking the
//! dispatch path without I/O and as a drop-in target in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use courier_protocol::Job;

use crate::{Notifier, ServiceContext, ServiceError};

/// Notifier that accepts and discards every job
#[derive(Debug, Default)]
pub struct NullNotifier {
    delivered: AtomicU64,
}

impl NullNotifier {
    /// Create a fresh counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs discarded so far
    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    fn kind(&self) -> &'static str {
        "null"
    }

    async fn deliver(&self, _ctx: &ServiceContext, _job: &Job) -> Result<bool, ServiceError> {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }
}
