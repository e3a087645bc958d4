//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A route or cron section declares a malformed topic pattern
    #[error("section '{section}' has invalid topic pattern: {source}")]
    InvalidPattern {
        /// Name of the offending section
        section: String,
        /// Underlying pattern error
        #[source]
        source: courier_routing::PatternError,
    },

    /// A targets entry that cannot be parsed as `service` or `service:target`
    #[error("section '{section}' has invalid target address '{address}'")]
    InvalidTarget {
        /// Name of the offending section
        section: String,
        /// The address as written
        address: String,
    },

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g. "route", "cron task")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create an InvalidPattern error
    pub fn invalid_pattern(section: impl Into<String>, source: courier_routing::PatternError) -> Self {
        Self::InvalidPattern {
            section: section.into(),
            source,
        }
    }

    /// Create an InvalidTarget error
    pub fn invalid_target(section: impl Into<String>, address: impl Into<String>) -> Self {
        Self::InvalidTarget {
            section: section.into(),
            address: address.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }
}
