//! Courier - Cron
//!
//! Periodic tasks: registered helper functions invoked at fixed intervals,
//! whose results re-enter the routing pipeline as synthetic messages on the
//! task's topic.
//!
//! # Semantics
//!
//! - Distinct tasks tick independently; one task's ticks are serialized
//! - When a tick is still running as the next becomes due, the due tick is
//!   skipped and logged, never queued
//! - The schedule is aligned to the wall clock, so a slow tick does not
//!   accumulate drift
//! - Task functions may block; each runs on the blocking thread pool,
//!   isolated from the ingest path and from other tasks

use std::time::Duration;

use courier_protocol::Message;
use courier_transform::{CronFn, HelperOutcome};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One periodic task, ready to schedule
pub struct TaskSpec {
    /// Task name, used in logs
    pub name: String,

    /// The registered helper to invoke each tick
    pub func: CronFn,

    /// Tick interval
    pub interval: Duration,

    /// Run the first tick immediately instead of after one interval
    pub run_immediately: bool,

    /// Topic the result is published on; `None` discards results
    pub topic: Option<String>,
}

/// The running scheduler
pub struct Scheduler {
    handles: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Spawn one ticking task per spec
    ///
    /// Results are sent as synthetic [`Message`]s into the ingest channel,
    /// where they flow through matching and transformation like broker
    /// deliveries.
    pub fn start(tasks: Vec<TaskSpec>, ingest: mpsc::Sender<Message>) -> Self {
        let cancel = CancellationToken::new();
        let handles = tasks
            .into_iter()
            .map(|spec| {
                tracing::info!(
                    task = %spec.name,
                    interval_secs = spec.interval.as_secs_f64(),
                    immediately = spec.run_immediately,
                    "scheduling periodic task"
                );
                tokio::spawn(run_task(spec, ingest.clone(), cancel.clone()))
            })
            .collect();

        Self {
            handles: Mutex::new(handles),
            cancel,
        }
    }

    /// Number of scheduled tasks still running
    pub fn task_count(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Cancel all tasks and wait for them to exit
    ///
    /// An in-flight tick finishes; no further ticks fire.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        tracing::info!("scheduler stopped");
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("task_count", &self.task_count())
            .finish()
    }
}

async fn run_task(spec: TaskSpec, ingest: mpsc::Sender<Message>, cancel: CancellationToken) {
    let period = spec.interval;
    let first = if spec.run_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };

    // Skip (never queue) ticks that became due while the previous one was
    // still running; the next tick realigns to the wall-clock schedule.
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let began = Instant::now();
        let func = spec.func.clone();
        let outcome = match tokio::task::spawn_blocking(move || func()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(task = %spec.name, error = %e, "periodic task panicked");
                continue;
            }
        };

        match outcome {
            HelperOutcome::Keep(payload) => match &spec.topic {
                Some(topic) => {
                    let msg = Message::synthetic(topic.clone(), payload);
                    if ingest.send(msg).await.is_err() {
                        tracing::debug!(task = %spec.name, "ingest channel closed, stopping task");
                        break;
                    }
                }
                None => {
                    tracing::debug!(task = %spec.name, "task has no topic, discarding result");
                }
            },
            HelperOutcome::Drop => {
                tracing::debug!(task = %spec.name, "periodic task produced nothing");
            }
            HelperOutcome::Error(detail) => {
                tracing::warn!(task = %spec.name, error = %detail, "periodic task failed");
            }
        }

        let elapsed = began.elapsed();
        if elapsed > period {
            let skipped = (elapsed.as_secs_f64() / period.as_secs_f64()) as u64;
            for _ in 0..skipped {
                tracing::warn!(
                    task = %spec.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "periodic tick skipped: previous tick still running"
                );
            }
        }
    }

    tracing::debug!(task = %spec.name, "periodic task stopped");
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
