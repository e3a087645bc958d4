//! Route configuration
//!
//! A route binds a topic pattern to a transformation pipeline and a set of
//! targets. Routes are declared as an array of tables so that declaration
//! order survives parsing; the matcher reports equally-matching routes in
//! this order.
//!
//! # Example
//!
//! ```toml
//! [[routes]]
//! name = "hello"
//! topic = "hello/1"
//! targets = ["log:info"]
//! format = "{name}: {number}"
//!
//! [[routes]]
//! topic = "test/dyn"
//! targets = "log:{loglevel}"
//!
//! [[routes]]
//! topic = "alarm/#"
//! targets = { function = "alarm_targets" }
//! filter = "ignore_heartbeats"
//! priority = "{severity}"
//! ```

use serde::Deserialize;

/// How a route's targets are determined
///
/// Resolved once at configuration load into one of three forms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TargetsSpec {
    /// Fixed list of `service:target` addresses (or bare `service` to fan
    /// out to every target of that service)
    Static(Vec<String>),

    /// A single address template interpolated against the transform context,
    /// e.g. `"log:{loglevel}"`
    Template(String),

    /// A registered helper function computes the list per message
    Computed {
        /// Helper name in the engine's function registry
        function: String,
    },
}

/// How a route's notification body is produced
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormatSpec {
    /// `{name}` placeholder template rendered against the context
    Template(String),

    /// A registered helper function renders (or suppresses) the body
    Function {
        /// Helper name in the engine's function registry
        function: String,
    },
}

/// Job priority: a fixed number or a template evaluated per message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PrioritySpec {
    /// Fixed priority
    Fixed(i32),

    /// Template whose rendered value is parsed as an integer; parse failure
    /// falls back to 0
    Template(String),
}

/// One routing rule, immutable after load
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Route name; defaults to the topic pattern
    pub name: Option<String>,

    /// MQTT subscription pattern this route listens on
    pub topic: String,

    /// Target specification
    pub targets: TargetsSpec,

    /// Filter helper: a truthy result drops the message silently
    #[serde(default)]
    pub filter: Option<String>,

    /// Data-map helper: result is merged into the context
    #[serde(default)]
    pub datamap: Option<String>,

    /// All-data helper: applied per target during expansion
    #[serde(default)]
    pub alldata: Option<String>,

    /// Body format: template string or helper function
    #[serde(default)]
    pub format: Option<FormatSpec>,

    /// Title template
    #[serde(default)]
    pub title: Option<String>,

    /// Job priority
    #[serde(default)]
    pub priority: Option<PrioritySpec>,

    /// Re-delivery attempts before failover, overriding the global default
    #[serde(default)]
    pub retry: Option<u32>,

    /// Subscription QoS override for this route's pattern
    #[serde(default)]
    pub qos: Option<u8>,

    /// Per-route override of the global `skip_retained` default
    #[serde(default)]
    pub ignore_retained: Option<bool>,
}

impl RouteConfig {
    /// The route's name, falling back to its topic pattern
    pub fn effective_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.topic)
    }
}

/// The failover pseudo-route
///
/// Its targets are evaluated statically at startup and receive jobs that
/// exhausted their retries, plus broker-disconnect notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// `service:target` addresses
    pub targets: Vec<String>,
}

impl FailoverConfig {
    /// Whether any failover targets are configured
    pub fn is_configured(&self) -> bool {
        !self.targets.is_empty()
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
