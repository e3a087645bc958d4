//! Queue worker
//!
//! One worker drains one target's queue. A slow or failing notifier only
//! ever stalls its own target; every other queue keeps draining.

use std::sync::Arc;
use std::time::Duration;

use courier_protocol::{Job, Target};
use tokio_util::sync::CancellationToken;

use crate::engine::Shared;
use crate::queue::JobQueue;

/// Retry back-off never exceeds this, whatever the attempt count
const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub(crate) struct Worker {
    pub(crate) target: Target,
    pub(crate) queue: Arc<JobQueue>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) backoff: Duration,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    /// Drain the queue until it is closed and empty, or until hard cancel
    ///
    /// The cancel token is only observed between jobs; an in-flight deliver
    /// is never interrupted.
    pub(crate) async fn run(self) {
        tracing::debug!(target = %self.target, "dispatch worker starting");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                job = self.queue.pop() => match job {
                    Some(job) => self.handle(job).await,
                    None => break,
                },
            }
        }

        tracing::debug!(target = %self.target, "dispatch worker stopping");
    }

    async fn handle(&self, job: Job) {
        match self.shared.registry.dispatch(&job).await {
            Ok(true) => {
                self.shared.metrics.record_delivered();
                tracing::debug!(target = %self.target, topic = %job.topic, "notification delivered");
            }
            Ok(false) => {
                tracing::warn!(
                    target = %self.target,
                    topic = %job.topic,
                    attempt = job.attempt,
                    "notification failed or timed out"
                );
                self.retry_or_failover(job).await;
            }
            Err(e) => {
                // Full detail lands in the log; the error never escapes the
                // worker.
                tracing::error!(
                    target = %self.target,
                    topic = %job.topic,
                    attempt = job.attempt,
                    error = %e,
                    "cannot invoke service"
                );
                self.retry_or_failover(job).await;
            }
        }
    }

    async fn retry_or_failover(&self, mut job: Job) {
        self.shared.metrics.record_failed();
        job.attempt += 1;

        if job.attempt <= job.retry_limit {
            self.shared.metrics.record_retried();
            let delay = self.backoff.saturating_mul(job.attempt).min(MAX_BACKOFF);
            tracing::info!(
                target = %self.target,
                attempt = job.attempt,
                retry_limit = job.retry_limit,
                delay_ms = delay.as_millis() as u64,
                "retrying delivery"
            );

            // Back off, then re-enqueue at the tail. The sleep yields to
            // shutdown so an abandoned retry cannot outlive the grace
            // period.
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(target = %self.target, "retry abandoned at shutdown");
                }
                _ = tokio::time::sleep(delay) => {
                    self.shared.enqueue(job);
                }
            }
        } else if !job.failover {
            tracing::warn!(
                target = %self.target,
                topic = %job.topic,
                attempts = job.attempt,
                "delivery failed permanently, failing over"
            );
            self.shared.send_failover(&job);
        } else {
            // A failover job failed: log and discard, no recursion.
            self.shared.metrics.record_dropped_failover();
            tracing::warn!(
                target = %self.target,
                topic = %job.topic,
                "failover delivery failed, discarding job"
            );
        }
    }
}
