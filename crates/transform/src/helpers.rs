//! Helper registry
//!
//! User-supplied functions referenced by name from configuration. The
//! registry is populated once at startup by the host (a compiled-in table in
//! the shipped binary); routes resolve their helper names against it at
//! compile time.
//!
//! Every helper returns a [`HelperOutcome`]: an explicit `Keep`/`Drop`/
//! `Error` variant instead of sentinel values or panics.

use std::collections::HashMap;
use std::sync::Arc;

use courier_protocol::TransformContext;
use serde_json::{Map, Value};

/// Normalized helper result
///
/// - `Keep(value)` - the helper produced a value
/// - `Drop` - the helper asks for the message (or its own contribution) to
///   be discarded
/// - `Error(detail)` - the helper failed; the caller logs the detail and
///   applies its stage-specific recovery
#[derive(Debug, Clone, PartialEq)]
pub enum HelperOutcome<T> {
    /// The helper produced a value
    Keep(T),
    /// Discard the message (or this helper's contribution)
    Drop,
    /// The helper failed
    Error(String),
}

impl<T> HelperOutcome<T> {
    /// Build an `Error` outcome from anything displayable
    pub fn error(detail: impl std::fmt::Display) -> Self {
        Self::Error(detail.to_string())
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for HelperOutcome<T> {
    /// Map Rust's natural failure mode onto the helper contract
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Keep(value),
            Err(e) => Self::Error(e.to_string()),
        }
    }
}

/// Arguments passed to a filter helper
#[derive(Debug)]
pub struct FilterArgs<'a> {
    /// Concrete topic of the message
    pub topic: &'a str,
    /// Raw payload bytes
    pub payload: &'a [u8],
    /// Name of the route section being evaluated
    pub section: &'a str,
    /// Context accumulated so far
    pub context: &'a TransformContext,
}

/// Arguments passed to a targets helper
#[derive(Debug)]
pub struct TargetsArgs<'a> {
    /// Concrete topic of the message
    pub topic: &'a str,
    /// Context accumulated so far
    pub context: &'a TransformContext,
    /// Name of the route section being evaluated
    pub section: &'a str,
    /// Every declared `service:target` address, for helpers that pick from
    /// the configured set
    pub known_targets: &'a [String],
}

/// Filter helper: `Keep(true)` drops the message
pub type FilterFn = Arc<dyn Fn(FilterArgs<'_>) -> HelperOutcome<bool> + Send + Sync>;

/// Data helper (`datamap` / `alldata`): result is merged into the context
pub type DataFn =
    Arc<dyn Fn(&str, &TransformContext) -> HelperOutcome<Map<String, Value>> + Send + Sync>;

/// Format helper: renders the body from the decoded payload text and context
pub type FormatFn = Arc<dyn Fn(&str, &TransformContext) -> HelperOutcome<String> + Send + Sync>;

/// Targets helper: computes `service:target` addresses per message
pub type TargetsFn = Arc<dyn Fn(TargetsArgs<'_>) -> HelperOutcome<Vec<String>> + Send + Sync>;

/// Periodic-task helper: produces the payload published on the task's topic
pub type CronFn = Arc<dyn Fn() -> HelperOutcome<Vec<u8>> + Send + Sync>;

/// Named helper functions available to configuration
///
/// One namespace per helper kind: a `filter` and a `format` helper may share
/// a name without colliding.
#[derive(Default, Clone)]
pub struct HelperRegistry {
    filters: HashMap<String, FilterFn>,
    datamaps: HashMap<String, DataFn>,
    alldata: HashMap<String, DataFn>,
    formats: HashMap<String, FormatFn>,
    targets: HashMap<String, TargetsFn>,
    cron: HashMap<String, CronFn>,
}

impl HelperRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter helper
    pub fn register_filter(&mut self, name: impl Into<String>, func: FilterFn) -> &mut Self {
        self.filters.insert(name.into(), func);
        self
    }

    /// Register a datamap helper
    pub fn register_datamap(&mut self, name: impl Into<String>, func: DataFn) -> &mut Self {
        self.datamaps.insert(name.into(), func);
        self
    }

    /// Register an alldata helper
    pub fn register_alldata(&mut self, name: impl Into<String>, func: DataFn) -> &mut Self {
        self.alldata.insert(name.into(), func);
        self
    }

    /// Register a format helper
    pub fn register_format(&mut self, name: impl Into<String>, func: FormatFn) -> &mut Self {
        self.formats.insert(name.into(), func);
        self
    }

    /// Register a targets helper
    pub fn register_targets(&mut self, name: impl Into<String>, func: TargetsFn) -> &mut Self {
        self.targets.insert(name.into(), func);
        self
    }

    /// Register a periodic-task helper
    pub fn register_cron(&mut self, name: impl Into<String>, func: CronFn) -> &mut Self {
        self.cron.insert(name.into(), func);
        self
    }

    /// Look up a filter helper
    pub fn filter(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name)
    }

    /// Look up a datamap helper
    pub fn datamap(&self, name: &str) -> Option<&DataFn> {
        self.datamaps.get(name)
    }

    /// Look up an alldata helper
    pub fn alldata(&self, name: &str) -> Option<&DataFn> {
        self.alldata.get(name)
    }

    /// Look up a format helper
    pub fn format(&self, name: &str) -> Option<&FormatFn> {
        self.formats.get(name)
    }

    /// Look up a targets helper
    pub fn targets(&self, name: &str) -> Option<&TargetsFn> {
        self.targets.get(name)
    }

    /// Look up a periodic-task helper
    pub fn cron(&self, name: &str) -> Option<&CronFn> {
        self.cron.get(name)
    }
}

impl std::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("filters", &self.filters.len())
            .field("datamaps", &self.datamaps.len())
            .field("alldata", &self.alldata.len())
            .field("formats", &self.formats.len())
            .field("targets", &self.targets.len())
            .field("cron", &self.cron.len())
            .finish()
    }
}
