//! Per-instance service context
//!
//! Everything a plugin may know about the service instance it is delivering
//! for: the instance name, its options, its targets table, and the engine
//! version. Read-only after startup.

use std::collections::BTreeMap;

use courier_config::ServiceConfig;

/// Read-only view of one configured service instance
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Service instance name (the `[services.<name>]` section key)
    pub name: String,

    /// Plugin kind backing this instance
    pub kind: String,

    /// Engine version, for plugins that report it downstream
    pub version: &'static str,

    options: toml::Table,
    targets: BTreeMap<String, Vec<toml::Value>>,
}

impl ServiceContext {
    /// Build the context for one service section
    pub fn new(name: impl Into<String>, config: &ServiceConfig) -> Self {
        let name = name.into();
        let kind = config.effective_kind(&name).to_string();
        Self {
            name,
            kind,
            version: courier_protocol::VERSION,
            options: config.options.clone(),
            targets: config.targets.clone(),
        }
    }

    /// The ordered parameter sequence declared for a target
    pub fn target_params(&self, target: &str) -> Option<&[toml::Value]> {
        self.targets.get(target).map(Vec::as_slice)
    }

    /// The first parameter of a target, as a string
    ///
    /// Most built-in plugins carry exactly one string parameter (a path, a
    /// level, a URL).
    pub fn first_param(&self, target: &str) -> Option<&str> {
        self.target_params(target)?.first()?.as_str()
    }

    /// Names of every declared target
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Whether a target is declared
    pub fn has_target(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }

    /// A string option
    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// A boolean option
    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// An integer option
    pub fn opt_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_integer())
    }
}
