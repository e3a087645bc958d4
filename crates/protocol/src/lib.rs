//! Courier - Protocol
//!
//! Core data model shared by every courier crate.
//!
//! # Overview
//!
//! Four types flow through the engine:
//!
//! - [`Message`] - one immutable broker delivery (topic, payload, qos,
//!   retained flag, receive time)
//! - [`TransformContext`] - the named values the transform pipeline
//!   accumulates for one (route, message) pair
//! - [`Target`] - a `(service, target-name)` pair identifying exactly one
//!   dispatch queue
//! - [`Job`] - one delivery attempt sitting on exactly one target's queue
//!
//! ```text
//! [Message] → pipeline → [TransformContext] → expansion → [Job per Target]
//! ```
//!
//! A `Job` carries a deep snapshot of its context: once enqueued, nothing a
//! notifier plugin does can affect the routing of later messages.

mod context;
mod job;
mod message;
mod target;

pub use context::TransformContext;
pub use job::Job;
pub use message::Message;
pub use target::{Target, TargetParseError};

/// Engine version string, exposed to service plugins.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
