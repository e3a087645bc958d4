//! Service registry
//!
//! Holds every configured service instance and its backing plugin, and
//! performs the actual notifier call on behalf of the queue workers. The
//! registry is read-only after startup, so workers share it without locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use courier_config::ServiceConfig;
use courier_protocol::Job;
use courier_transform::TargetCatalog;

use crate::{Notifier, ServiceContext, ServiceError};

/// The set of available plugins, keyed by kind
///
/// Populated at startup from the compiled-in table (see
/// [`PluginSet::builtin`]) plus whatever the host registers on top.
#[derive(Default, Clone)]
pub struct PluginSet {
    plugins: HashMap<&'static str, Arc<dyn Notifier>>,
}

impl PluginSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in plugins: `log`, `file`, `http`, `null`
    #[must_use]
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.register(Arc::new(crate::LogNotifier));
        set.register(Arc::new(crate::FileNotifier));
        set.register(Arc::new(crate::HttpNotifier::new()));
        set.register(Arc::new(crate::NullNotifier::new()));
        set
    }

    /// Register a plugin under its own kind, replacing any previous one
    pub fn register(&mut self, plugin: Arc<dyn Notifier>) -> &mut Self {
        self.plugins.insert(plugin.kind(), plugin);
        self
    }

    /// Look up a plugin by kind
    pub fn get(&self, kind: &str) -> Option<Arc<dyn Notifier>> {
        self.plugins.get(kind).cloned()
    }

    /// The registered kinds
    pub fn kinds(&self) -> Vec<&'static str> {
        self.plugins.keys().copied().collect()
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}

struct ServiceEntry {
    context: Arc<ServiceContext>,
    plugin: Arc<dyn Notifier>,
}

/// All configured service instances
pub struct ServiceRegistry {
    services: HashMap<String, ServiceEntry>,
    deliver_timeout: Duration,
}

impl ServiceRegistry {
    /// Build the registry from the `[services.*]` sections
    ///
    /// Disabled services are skipped with a log entry. A section whose kind
    /// no plugin implements is a fatal configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownKind`] for an unimplemented kind.
    pub fn build(
        configs: &BTreeMap<String, ServiceConfig>,
        plugins: &PluginSet,
        deliver_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let mut services = HashMap::with_capacity(configs.len());

        for (name, config) in configs {
            if !config.enabled {
                tracing::info!(service = %name, "service disabled, skipping");
                continue;
            }

            let context = ServiceContext::new(name.clone(), config);
            let plugin =
                plugins
                    .get(&context.kind)
                    .ok_or_else(|| ServiceError::UnknownKind {
                        service: name.clone(),
                        kind: context.kind.clone(),
                    })?;

            if config.targets.is_empty() {
                tracing::warn!(service = %name, "service has no targets declared");
            }

            tracing::debug!(service = %name, kind = %context.kind, "service configured");
            services.insert(
                name.clone(),
                ServiceEntry {
                    context: Arc::new(context),
                    plugin,
                },
            );
        }

        Ok(Self {
            services,
            deliver_timeout,
        })
    }

    /// Run every service's `init` hook once
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Init`] for the first hook that fails.
    pub async fn init_all(&self) -> Result<(), ServiceError> {
        for (name, entry) in &self.services {
            entry
                .plugin
                .init(&entry.context)
                .await
                .map_err(|e| ServiceError::Init {
                    service: name.clone(),
                    detail: e.to_string(),
                })?;
            tracing::info!(service = %name, kind = %entry.context.kind, "service initialized");
        }
        Ok(())
    }

    /// Deliver one job through its service's plugin
    ///
    /// The call runs in its own task under the per-job timeout, so a hung
    /// or panicking plugin is reported as an error instead of taking the
    /// calling worker down.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::UnknownTarget`] when the job's address resolves to
    ///   no configured service or target
    /// - [`ServiceError::Timeout`] when the plugin exceeds the deadline
    /// - [`ServiceError::Panic`] when the plugin panicked
    /// - whatever error the plugin itself returned
    pub async fn dispatch(&self, job: &Job) -> Result<bool, ServiceError> {
        let entry =
            self.services
                .get(&job.target.service)
                .ok_or_else(|| ServiceError::UnknownTarget {
                    target: job.target.to_string(),
                })?;

        if !entry.context.has_target(&job.target.name) {
            return Err(ServiceError::UnknownTarget {
                target: job.target.to_string(),
            });
        }

        let plugin = Arc::clone(&entry.plugin);
        let context = Arc::clone(&entry.context);
        let job = job.clone();
        let target = job.target.to_string();
        let timeout = self.deliver_timeout;

        let handle = tokio::spawn(async move {
            tokio::time::timeout(timeout, plugin.deliver(&context, &job)).await
        });

        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(_elapsed)) => Err(ServiceError::Timeout {
                target,
                seconds: timeout.as_secs(),
            }),
            Err(join_err) if join_err.is_panic() => Err(ServiceError::Panic {
                target,
                detail: panic_detail(join_err.into_panic()),
            }),
            Err(_) => Err(ServiceError::Delivery {
                target,
                detail: "delivery task cancelled".into(),
            }),
        }
    }

    /// Number of configured services
    #[inline]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check whether any services are configured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Names of all configured services
    pub fn service_names(&self) -> Vec<&str> {
        self.services.keys().map(String::as_str).collect()
    }

    /// Every declared `(service, target)` pair
    ///
    /// The dispatch engine creates one queue and one worker per entry.
    pub fn declared_targets(&self) -> Vec<courier_protocol::Target> {
        let mut targets: Vec<courier_protocol::Target> = self
            .services
            .iter()
            .flat_map(|(name, entry)| {
                entry
                    .context
                    .target_names()
                    .map(move |t| courier_protocol::Target::new(name.clone(), t))
            })
            .collect();
        targets.sort();
        targets
    }
}

impl TargetCatalog for ServiceRegistry {
    fn has_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    fn has_target(&self, service: &str, target: &str) -> bool {
        self.services
            .get(service)
            .is_some_and(|entry| entry.context.has_target(target))
    }

    fn service_targets(&self, service: &str) -> Vec<String> {
        self.services
            .get(service)
            .map(|entry| entry.context.target_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn all_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .services
            .iter()
            .flat_map(|(name, entry)| {
                entry
                    .context
                    .target_names()
                    .map(move |t| format!("{name}:{t}"))
            })
            .collect();
        addresses.sort();
        addresses
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("service_count", &self.services.len())
            .finish()
    }
}

/// Stringify a panic payload for the logs
fn panic_detail(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".into()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
