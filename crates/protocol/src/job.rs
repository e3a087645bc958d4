//! Dispatch jobs
//!
//! A `Job` is the unit of work placed on one target's dispatch queue. It owns
//! a deep snapshot of the transform context, so downstream notifiers can
//! never affect the routing of later messages.

use bytes::Bytes;

use crate::{Target, TransformContext};

/// One delivery attempt for one target
#[derive(Debug, Clone)]
pub struct Job {
    /// Destination queue address
    pub target: Target,

    /// Optional notification title, already rendered
    pub title: Option<String>,

    /// Formatted notification body
    pub body: String,

    /// Deep snapshot of the transform context at enqueue time
    pub context: TransformContext,

    /// Topic of the originating message
    pub topic: String,

    /// Raw payload of the originating message
    pub payload: Bytes,

    /// Route priority, 0 when unset
    pub priority: i32,

    /// Delivery attempts performed so far
    pub attempt: u32,

    /// Re-delivery attempts allowed before this job moves to the failover
    /// path (the route's limit, or the global default)
    pub retry_limit: u32,

    /// Set on jobs synthesized by the failover path; such jobs are never
    /// failed over again
    pub failover: bool,
}

impl Job {
    /// Synthesize the failover copy of a permanently failed job
    ///
    /// The copy carries the failed job's metadata but a fresh attempt count,
    /// and is marked so it cannot recurse through failover again.
    #[must_use]
    pub fn failover_to(&self, target: Target) -> Self {
        Self {
            target,
            attempt: 0,
            retry_limit: 0,
            failover: true,
            ..self.clone()
        }
    }
}
