//! Courier - Dispatch
//!
//! The delivery half of the engine: one bounded FIFO queue per
//! `(service, target)` pair, each drained by exactly one worker.
//!
//! # Architecture
//!
//! ```text
//! [Ingest] --Job--> [JobQueue log:info]  --> [Worker] --> Notifier
//!              \--> [JobQueue file:f01] --> [Worker] --> Notifier
//! ```
//!
//! - Enqueue is O(1) and never blocks the ingest path; a full queue drops
//!   its oldest job with a warning (backpressure without blocking)
//! - Ordering is FIFO per target; nothing is promised across targets
//! - A worker that sees a failed delivery retries up to the job's retry
//!   limit with a bounded back-off, then synthesizes failover jobs
//! - Failover jobs that themselves fail are logged and discarded, so the
//!   failover path cannot recurse
//! - Shutdown closes every queue, lets workers drain for a grace period,
//!   then abandons whatever is left with a summary log

mod engine;
mod metrics;
mod queue;
mod worker;

pub use engine::{DispatchEngine, DispatchOptions};
pub use metrics::{DispatchMetrics, DispatchSnapshot};
pub use queue::{JobQueue, Push};
