//! Structural configuration validation
//!
//! Runs right after parsing, before any component is built. Catches what
//! TOML's type system cannot: malformed topic patterns, unparseable target
//! addresses, and nonsensical numeric values. Cross-references against the
//! helper registry and service plugins happen later, at engine build time.

use courier_routing::TopicPattern;

use crate::{Config, ConfigError, Result, TargetsSpec};

/// Validate a parsed configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_defaults(config)?;
    validate_broker(config)?;

    for route in &config.routes {
        let section = route.effective_name();

        TopicPattern::parse(&route.topic)
            .map_err(|e| ConfigError::invalid_pattern(section, e))?;

        if let Some(qos) = route.qos
            && qos > 2
        {
            return Err(ConfigError::invalid_value(
                "route",
                section,
                "qos",
                format!("{qos} is not a valid QoS (0, 1 or 2)"),
            ));
        }

        match &route.targets {
            TargetsSpec::Static(entries) => {
                if entries.is_empty() {
                    return Err(ConfigError::missing_field("route", section, "targets"));
                }
                for entry in entries {
                    validate_address(section, entry)?;
                }
            }
            TargetsSpec::Template(template) => {
                if template.is_empty() {
                    return Err(ConfigError::missing_field("route", section, "targets"));
                }
            }
            TargetsSpec::Computed { function } => {
                if function.is_empty() {
                    return Err(ConfigError::missing_field("route", section, "targets"));
                }
            }
        }
    }

    for entry in &config.failover.targets {
        validate_address("failover", entry)?;
    }

    for task in &config.cron {
        if task.name.is_empty() {
            return Err(ConfigError::missing_field("cron task", &task.name, "name"));
        }
        if task.function.is_empty() {
            return Err(ConfigError::missing_field("cron task", &task.name, "function"));
        }
        if !(task.interval > 0.0) {
            return Err(ConfigError::invalid_value(
                "cron task",
                &task.name,
                "interval",
                "must be positive",
            ));
        }
        if task.targets.is_some() && task.topic.is_none() {
            return Err(ConfigError::missing_field("cron task", &task.name, "topic"));
        }
        if let Some(targets) = &task.targets {
            for entry in targets {
                validate_address(&task.name, entry)?;
            }
        }
    }

    Ok(())
}

/// Check one `service` or `service:target` address for parseability
///
/// A bare service name is legal: it fans out to every target of that
/// service at expansion time.
fn validate_address(section: &str, address: &str) -> Result<()> {
    let ok = match address.split_once(':') {
        Some((service, target)) => !service.is_empty() && !target.is_empty(),
        None => !address.is_empty(),
    };

    if ok {
        Ok(())
    } else {
        Err(ConfigError::invalid_target(section, address))
    }
}

fn validate_defaults(config: &Config) -> Result<()> {
    if config.defaults.queue_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "defaults",
            "defaults",
            "queue_capacity",
            "must be at least 1",
        ));
    }
    if config.defaults.deliver_timeout_secs == 0 {
        return Err(ConfigError::invalid_value(
            "defaults",
            "defaults",
            "deliver_timeout_secs",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_broker(config: &Config) -> Result<()> {
    if config.broker.host.is_empty() {
        return Err(ConfigError::missing_field("broker", "broker", "host"));
    }
    if config.broker.reconnect_min_secs == 0
        || config.broker.reconnect_min_secs > config.broker.reconnect_max_secs
    {
        return Err(ConfigError::invalid_value(
            "broker",
            "broker",
            "reconnect_min_secs",
            "must be positive and no larger than reconnect_max_secs",
        ));
    }
    Ok(())
}
