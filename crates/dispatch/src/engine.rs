//! Dispatch engine
//!
//! Owns one queue and one worker per declared `(service, target)` pair plus
//! the failover path. Built after the service registry, torn down before it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use courier_protocol::{Job, Target, TransformContext};
use courier_services::ServiceRegistry;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::metrics::{DispatchMetrics, DispatchSnapshot};
use crate::queue::{JobQueue, Push};
use crate::worker::Worker;

/// Tunables for the dispatch subsystem
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Bounded capacity of each per-target queue
    pub queue_capacity: usize,

    /// Base back-off between delivery retries
    pub retry_backoff: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// State shared between the engine handle and its workers
pub(crate) struct Shared {
    pub(crate) registry: Arc<ServiceRegistry>,
    pub(crate) queues: HashMap<Target, Arc<JobQueue>>,
    pub(crate) failover_targets: Vec<Target>,
    pub(crate) metrics: DispatchMetrics,
}

impl Shared {
    /// Enqueue one job onto its target's queue
    ///
    /// O(1) and non-blocking; a full queue evicts its oldest job with a
    /// warning. Returns whether the job was accepted.
    pub(crate) fn enqueue(&self, job: Job) -> bool {
        let Some(queue) = self.queues.get(&job.target) else {
            tracing::error!(target = %job.target, "no dispatch queue for target, dropping job");
            return false;
        };

        match queue.push(job) {
            Push::Queued => {
                self.metrics.record_enqueued();
                true
            }
            Push::DroppedOldest(evicted) => {
                self.metrics.record_enqueued();
                self.metrics.record_dropped_capacity();
                tracing::warn!(
                    target = %evicted.target,
                    topic = %evicted.topic,
                    capacity = queue.capacity(),
                    "queue full, dropped oldest job"
                );
                true
            }
            Push::Closed(job) => {
                tracing::warn!(target = %job.target, "queue closed, dropping job");
                false
            }
        }
    }

    /// Synthesize failover copies of a permanently failed job
    pub(crate) fn send_failover(&self, failed: &Job) {
        if self.failover_targets.is_empty() {
            tracing::warn!(
                target = %failed.target,
                topic = %failed.topic,
                "no failover targets configured, dropping job"
            );
            return;
        }

        for target in &self.failover_targets {
            let copy = failed.failover_to(target.clone());
            tracing::debug!(
                from = %failed.target,
                to = %target,
                topic = %failed.topic,
                "enqueueing failover job"
            );
            if self.enqueue(copy) {
                self.metrics.record_failed_over();
            }
        }
    }
}

/// The running dispatch subsystem
pub struct DispatchEngine {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl DispatchEngine {
    /// Create the queues and spawn one worker per declared target
    ///
    /// Must run inside a tokio runtime.
    pub fn start(
        registry: Arc<ServiceRegistry>,
        failover_targets: Vec<Target>,
        options: DispatchOptions,
    ) -> Self {
        let mut queues = HashMap::new();
        for target in registry.declared_targets() {
            queues.insert(target, Arc::new(JobQueue::new(options.queue_capacity)));
        }

        let shared = Arc::new(Shared {
            registry,
            queues,
            failover_targets,
            metrics: DispatchMetrics::new(),
        });

        let cancel = CancellationToken::new();
        let workers = shared
            .queues
            .iter()
            .map(|(target, queue)| {
                let worker = Worker {
                    target: target.clone(),
                    queue: Arc::clone(queue),
                    shared: Arc::clone(&shared),
                    backoff: options.retry_backoff,
                    cancel: cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        tracing::info!(
            queue_count = shared.queues.len(),
            queue_capacity = options.queue_capacity,
            failover_targets = shared.failover_targets.len(),
            "dispatch engine started"
        );

        Self {
            shared,
            workers: Mutex::new(workers),
            cancel,
        }
    }

    /// Enqueue one job; returns whether it was accepted
    #[inline]
    pub fn enqueue(&self, job: Job) -> bool {
        self.shared.enqueue(job)
    }

    /// Send an engine-level event (e.g. broker disconnect) to the failover
    /// targets
    ///
    /// The event is logged regardless; failover jobs are only synthesized
    /// when failover targets exist.
    pub fn notify_failover(&self, reason: &str, text: &str) {
        tracing::warn!(reason = %reason, "{}", text);

        for target in &self.shared.failover_targets {
            let job = Job {
                target: target.clone(),
                title: Some(reason.to_string()),
                body: text.to_string(),
                context: TransformContext::new(),
                topic: reason.to_string(),
                payload: text.as_bytes().to_vec().into(),
                priority: 0,
                attempt: 0,
                retry_limit: 0,
                failover: true,
            };
            if self.shared.enqueue(job) {
                self.shared.metrics.record_failed_over();
            }
        }
    }

    /// Number of dispatch queues (one per declared target)
    pub fn queue_count(&self) -> usize {
        self.shared.queues.len()
    }

    /// Jobs currently sitting on queues
    pub fn pending_jobs(&self) -> usize {
        self.shared.queues.values().map(|q| q.len()).sum()
    }

    /// Snapshot of the dispatch counters
    pub fn metrics(&self) -> DispatchSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Drain and stop all workers
    ///
    /// Queues are closed immediately (no new jobs); workers drain what is
    /// already queued for up to the grace period, after which remaining
    /// jobs are abandoned with a summary log.
    pub async fn shutdown(&self, grace: Duration) {
        tracing::info!(
            grace_secs = grace.as_secs(),
            pending_jobs = self.pending_jobs(),
            "dispatch engine shutting down"
        );

        for queue in self.shared.queues.values() {
            queue.close();
        }

        let mut handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();

        let drained = tokio::time::timeout(grace, async {
            for handle in handles.iter_mut() {
                let _ = handle.await;
            }
        })
        .await;

        if drained.is_err() {
            let abandoned = self.pending_jobs() as u64;
            self.shared.metrics.record_dropped_shutdown(abandoned);
            tracing::warn!(
                abandoned_jobs = abandoned,
                "grace period expired, abandoning pending jobs"
            );

            self.cancel.cancel();
            for handle in handles {
                if !handle.is_finished() {
                    let _ = handle.await;
                }
            }
        }

        let snapshot = self.shared.metrics.snapshot();
        tracing::info!(
            jobs_enqueued = snapshot.jobs_enqueued,
            jobs_delivered = snapshot.jobs_delivered,
            jobs_failed = snapshot.jobs_failed,
            jobs_failed_over = snapshot.jobs_failed_over,
            jobs_dropped_capacity = snapshot.jobs_dropped_capacity,
            jobs_dropped_shutdown = snapshot.jobs_dropped_shutdown,
            "dispatch engine stopped"
        );
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("queue_count", &self.queue_count())
            .field("pending_jobs", &self.pending_jobs())
            .finish()
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
