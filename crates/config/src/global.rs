//! Engine-wide default settings
//!
//! These apply across all routes and dispatch queues unless a route
//! overrides them.

use serde::Deserialize;

/// Global defaults for the routing and dispatch engine
///
/// All fields have sensible defaults - you only need to specify what you
/// want to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Drop retained messages unless a route opts back in
    /// Default: false
    pub skip_retained: bool,

    /// Bounded capacity of each per-target dispatch queue; on overflow the
    /// oldest job is dropped
    /// Default: 100
    pub queue_capacity: usize,

    /// Re-delivery attempts before a job is moved to the failover path
    /// Default: 0 (fail over on the first failure)
    pub retry_limit: u32,

    /// Base back-off between delivery retries, milliseconds
    /// Default: 1000
    pub retry_backoff_ms: u64,

    /// Per-job notifier call timeout, seconds
    /// Default: 10
    pub deliver_timeout_secs: u64,

    /// How long shutdown waits for queues to drain before abandoning
    /// pending jobs, seconds
    /// Default: 5
    pub grace_period_secs: u64,

    /// Reject configuration whose routes reference unknown services or
    /// targets instead of skipping those routes with a warning
    /// Default: false (lenient)
    pub strict: bool,

    /// Treat missing template keys as an error that drops the message,
    /// instead of rendering the literal placeholder
    /// Default: false
    pub strict_format: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            skip_retained: false,
            queue_capacity: 100,
            retry_limit: 0,
            retry_backoff_ms: 1000,
            deliver_timeout_secs: 10,
            grace_period_secs: 5,
            strict: false,
            strict_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GlobalConfig::default();
        assert!(!config.skip_retained);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.retry_limit, 0);
        assert_eq!(config.deliver_timeout_secs, 10);
        assert_eq!(config.grace_period_secs, 5);
        assert!(!config.strict);
        assert!(!config.strict_format);
    }

    #[test]
    fn test_deserialize_empty() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
queue_capacity = 500
retry_limit = 3
strict = true
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.queue_capacity, 500);
        assert_eq!(config.retry_limit, 3);
        assert!(config.strict);
        // Defaults still apply
        assert_eq!(config.retry_backoff_ms, 1000);
        assert!(!config.strict_format);
    }
}
