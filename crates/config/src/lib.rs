//! Courier Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use courier_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     "[services.log]\n[services.log.targets]\ninfo = [\"info\"]",
//! )
//! .unwrap();
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [broker]
//! host = "localhost"
//!
//! [services.log]
//! [services.log.targets]
//! info = ["info"]
//!
//! [[routes]]
//! topic = "hello/1"
//! targets = ["log:info"]
//! ```
//!
//! Route sections are `[[routes]]` arrays: declaration order is the order
//! the matcher reports equally-matching routes in, so it must survive
//! parsing.

mod broker;
mod cron;
mod error;
mod global;
mod logging;
mod routes;
mod services;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use broker::BrokerConfig;
pub use cron::CronTaskConfig;
pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use routes::{FailoverConfig, FormatSpec, PrioritySpec, RouteConfig, TargetsSpec};
pub use services::ServiceConfig;

use std::collections::BTreeMap;

/// Main configuration structure
///
/// All sections are optional with sensible defaults, except that a running
/// daemon needs at least one service and one route to do anything useful.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine-wide defaults (queue capacity, retry policy, grace period)
    pub defaults: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Broker connection settings
    pub broker: BrokerConfig,

    /// Service instances, keyed by name
    pub services: BTreeMap<String, ServiceConfig>,

    /// Routing rules, in declaration order
    pub routes: Vec<RouteConfig>,

    /// Targets that receive jobs which exhausted their retries
    pub failover: FailoverConfig,

    /// Periodic tasks
    pub cron: Vec<CronTaskConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks for:
    /// - Well-formed topic patterns on every route and cron task
    /// - Parseable target addresses
    /// - Positive intervals, capacities and timeouts
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Get the names of all declared services
    pub fn service_names(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    /// Look up a route section by its effective name
    pub fn route(&self, name: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|r| r.effective_name() == name)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
