//! Periodic task configuration
//!
//! Each `[[cron]]` section schedules a registered helper function at a fixed
//! interval. The function's return value is treated as a message published
//! on the task's topic and re-enters the routing pipeline.
//!
//! # Example
//!
//! ```toml
//! [[cron]]
//! name = "uptime"
//! function = "publish_uptime"
//! interval = 60.0
//! now = true
//! topic = "courier/uptime"
//! ```

use serde::Deserialize;

/// One periodic task
#[derive(Debug, Clone, Deserialize)]
pub struct CronTaskConfig {
    /// Task name, used in logs
    pub name: String,

    /// Helper name in the engine's function registry
    pub function: String,

    /// Tick interval in seconds (fractional values allowed)
    pub interval: f64,

    /// Run the first tick immediately at startup instead of after one
    /// interval
    #[serde(default)]
    pub now: bool,

    /// Topic the task's result is published on; without a topic the result
    /// is discarded
    #[serde(default)]
    pub topic: Option<String>,

    /// Optional direct targets; when set, a synthetic route for the task's
    /// topic is added so results reach these targets without further
    /// configuration
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}
