//! Service instance configuration
//!
//! Each `[services.<name>]` section declares one service instance: which
//! plugin kind backs it, its targets table, and plugin-specific options.
//! Target parameters are an ordered sequence of opaque values whose meaning
//! is defined by the plugin (a path for `file`, a level for `log`, ...).

use std::collections::BTreeMap;

use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// One declared service instance
///
/// # Example
///
/// ```toml
/// [services.file]
/// append_newline = true
///
/// [services.file.targets]
/// mylog = ["/var/log/courier/my.log"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Plugin kind backing this service; defaults to the section name, so
    /// `[services.log]` uses the `log` plugin unless overridden
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Whether this service is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Target tables: target name → ordered parameter sequence
    #[serde(default)]
    pub targets: BTreeMap<String, Vec<toml::Value>>,

    /// Remaining keys are plugin-specific options
    #[serde(flatten)]
    pub options: toml::Table,
}

impl ServiceConfig {
    /// The plugin kind, falling back to the service's own name
    pub fn effective_kind<'a>(&'a self, name: &'a str) -> &'a str {
        self.kind.as_deref().unwrap_or(name)
    }

    /// Look up one target's parameter sequence
    pub fn target_params(&self, target: &str) -> Option<&[toml::Value]> {
        self.targets.get(target).map(Vec::as_slice)
    }

    /// Names of all declared targets
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}
