//! Courier - Transform
//!
//! The per-message transformation machinery: helper registry, `{name}`
//! template interpolation, compiled routes, the pipeline stages, and target
//! expansion.
//!
//! # Overview
//!
//! For each (route, message) pair the pipeline runs these stages, any of
//! which may short-circuit:
//!
//! 1. Retained-message filter
//! 2. Base context (message fields, topic captures, time fields)
//! 3. Payload JSON decode (merge on success, never fatal)
//! 4. `filter` helper (truthy result drops the message)
//! 5. `datamap` helper (result merged into the context)
//! 6. Body format (template or helper; may suppress)
//! 7. Target expansion (static list, address template, or helper)
//! 8. One [`Job`](courier_protocol::Job) per target, each with its own
//!    `alldata`-augmented context snapshot
//!
//! # Design Principles
//!
//! - **Side-effect free**: nothing before the enqueue mutates engine state
//! - **Fail soft**: a broken helper logs and degrades, it never stops the
//!   ingest path; a broken `filter` fails towards delivery
//! - **Explicit capabilities**: configuration refers to helpers by name in a
//!   [`HelperRegistry`] populated at startup - there is no runtime symbol
//!   lookup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use courier_transform::{HelperOutcome, HelperRegistry};
//!
//! let mut helpers = HelperRegistry::new();
//! helpers.register_filter("ignore_empty", Arc::new(|args| {
//!     HelperOutcome::Keep(args.payload.is_empty())
//! }));
//! assert!(helpers.filter("ignore_empty").is_some());
//! ```

mod error;
mod expander;
mod helpers;
mod pipeline;
mod route;
pub mod template;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::CompileError;
pub use expander::{TargetCatalog, expand_targets, resolve_address};
pub use helpers::{
    CronFn, DataFn, FilterArgs, FilterFn, FormatFn, HelperOutcome, HelperRegistry, TargetsArgs,
    TargetsFn,
};
pub use pipeline::{Pipeline, PipelineSettings};
pub use route::{ResolvedTargets, Route, RouteFormat, RouteTable};
pub use template::TemplateError;
