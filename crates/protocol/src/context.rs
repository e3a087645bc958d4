//! Transformation context
//!
//! The named values the transform pipeline accumulates for one
//! (route, message) pair. Starts from the message fields, is extended by
//! payload decoding and the route's data-map helpers, and ends up snapshotted
//! into each [`crate::Job`].

use serde_json::{Map, Value};

/// Mutable map of named values built up by the transform pipeline
///
/// Values are JSON values so helper results and decoded payloads merge
/// uniformly. Cloning produces a deep, disconnected snapshot: a `Job`'s
/// context can never be mutated through the pipeline's copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    values: Map<String, Value>,
}

impl TransformContext {
    /// Create an empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by name
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Check whether a key is present
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Merge another map into this context, overwriting existing keys
    pub fn merge(&mut self, other: Map<String, Value>) {
        for (key, value) in other {
            self.values.insert(key, value);
        }
    }

    /// Number of values in the context
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the context is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all (name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Borrow the underlying map
    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Render a value for placeholder interpolation
    ///
    /// Total and locale-independent: strings embed as-is, everything else as
    /// its round-trippable JSON text.
    pub fn render_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for TransformContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
