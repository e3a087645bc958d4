//! Target addresses
//!
//! A `Target` names exactly one dispatch queue and one configuration entry
//! within a service's targets table. The textual form is `service:target`,
//! e.g. `log:info` or `file:mylog`.

use std::fmt;
use std::str::FromStr;

/// A `(service, target-name)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    /// Service instance name, e.g. `log`
    pub service: String,

    /// Target name within the service's targets table, e.g. `info`
    pub name: String,
}

impl Target {
    /// Create a target from its two components
    pub fn new(service: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.name)
    }
}

/// Error parsing a `service:target` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetParseError {
    /// The offending input
    pub input: String,
}

impl fmt::Display for TargetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid target address '{}': expected 'service:target'", self.input)
    }
}

impl std::error::Error for TargetParseError {}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((service, name)) if !service.is_empty() && !name.is_empty() => {
                Ok(Self::new(service, name))
            }
            _ => Err(TargetParseError { input: s.into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        let target: Target = "log:info".parse().unwrap();
        assert_eq!(target, Target::new("log", "info"));
        assert_eq!(target.to_string(), "log:info");
    }

    #[test]
    fn parse_keeps_extra_colons_in_name() {
        let target: Target = "http:https://example.org/hook".parse().unwrap();
        assert_eq!(target.service, "http");
        assert_eq!(target.name, "https://example.org/hook");
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!("log".parse::<Target>().is_err());
        assert!(":info".parse::<Target>().is_err());
        assert!("log:".parse::<Target>().is_err());
        assert!("".parse::<Target>().is_err());
    }
}
