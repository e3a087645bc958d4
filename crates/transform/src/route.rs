//! Compiled routes
//!
//! Configuration sections are compiled once at startup into [`Route`]
//! values: topic patterns parsed, helper names resolved against the
//! registry, and static target lists validated against the service catalog.
//! Unresolved references are rejected in strict mode, or logged and the
//! route skipped in lenient mode - never silently accepted.

use courier_config::{FormatSpec, PrioritySpec, RouteConfig, TargetsSpec};
use courier_protocol::Target;
use courier_routing::{TopicPattern, TopicTree};

use crate::error::CompileError;
use crate::expander::TargetCatalog;
use crate::helpers::{DataFn, FilterFn, FormatFn, HelperRegistry, TargetsFn};

/// A route's targets after load-time resolution
#[derive(Clone)]
pub enum ResolvedTargets {
    /// Fixed list, fully validated at compile time
    Static(Vec<Target>),

    /// Address template interpolated per message
    Template(String),

    /// Helper function invoked per message
    Computed {
        /// Helper name, kept for logs
        name: String,
        /// The resolved function
        func: TargetsFn,
    },
}

/// A route's body format after load-time resolution
#[derive(Clone)]
pub enum RouteFormat {
    /// `{name}` template
    Template(String),

    /// Helper function
    Function {
        /// Helper name, kept for logs
        name: String,
        /// The resolved function
        func: FormatFn,
    },
}

/// One compiled routing rule, immutable after startup
#[derive(Clone)]
pub struct Route {
    /// Section name, used in logs and helper invocations
    pub name: String,

    /// Parsed subscription pattern
    pub pattern: TopicPattern,

    /// Resolved target specification
    pub targets: ResolvedTargets,

    /// Resolved filter helper
    pub filter: Option<(String, FilterFn)>,

    /// Resolved datamap helper
    pub datamap: Option<(String, DataFn)>,

    /// Resolved alldata helper, applied per target
    pub alldata: Option<(String, DataFn)>,

    /// Resolved body format
    pub format: Option<RouteFormat>,

    /// Title template
    pub title: Option<String>,

    /// Priority specification
    pub priority: Option<PrioritySpec>,

    /// Re-delivery attempts before failover, overriding the global default
    pub retry: Option<u32>,

    /// Subscription QoS for this route's pattern
    pub qos: u8,

    /// Per-route override of the global retained-message policy
    pub ignore_retained: Option<bool>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("qos", &self.qos)
            .finish()
    }
}

/// All compiled routes plus the subscription matcher over them
pub struct RouteTable {
    routes: Vec<Route>,
    tree: TopicTree<usize>,
}

impl RouteTable {
    /// Compile configuration sections into a route table
    ///
    /// In strict mode any unresolved helper, service or target reference is
    /// a fatal [`CompileError`]. In lenient mode the offending route is
    /// logged and skipped; malformed topic patterns are fatal either way.
    ///
    /// # Errors
    ///
    /// Returns the first fatal compilation error.
    pub fn compile(
        configs: &[RouteConfig],
        helpers: &HelperRegistry,
        catalog: &dyn TargetCatalog,
        strict: bool,
    ) -> Result<Self, CompileError> {
        let mut routes = Vec::with_capacity(configs.len());
        let mut tree = TopicTree::new();

        for config in configs {
            if let Some(route) = compile_route(config, helpers, catalog, strict)? {
                tree.insert(route.pattern.clone(), routes.len());
                routes.push(route);
            }
        }

        Ok(Self { routes, tree })
    }

    /// Routes matching a concrete topic, in declaration order
    ///
    /// Pure: repeated calls with the same topic return the same list.
    pub fn matches(&self, topic: &str) -> Vec<&Route> {
        self.tree
            .matches(topic)
            .into_iter()
            .map(|&i| &self.routes[i])
            .collect()
    }

    /// All compiled routes in declaration order
    #[inline]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of compiled routes
    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check whether the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Unique subscription patterns with the maximum QoS requested for each
    ///
    /// The supervisor subscribes each pattern exactly once, at the highest
    /// QoS any of its routes asked for.
    pub fn subscriptions(&self) -> Vec<(String, u8)> {
        let mut subs: Vec<(String, u8)> = Vec::new();
        for route in &self.routes {
            let pattern = route.pattern.as_str();
            match subs.iter_mut().find(|(p, _)| p == pattern) {
                Some((_, qos)) => *qos = (*qos).max(route.qos),
                None => subs.push((pattern.to_string(), route.qos)),
            }
        }
        subs
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("route_count", &self.routes.len())
            .finish()
    }
}

/// Compile one section; `Ok(None)` means the route was skipped leniently
fn compile_route(
    config: &RouteConfig,
    helpers: &HelperRegistry,
    catalog: &dyn TargetCatalog,
    strict: bool,
) -> Result<Option<Route>, CompileError> {
    let section = config.effective_name().to_string();

    let pattern = TopicPattern::parse(&config.topic).map_err(|source| CompileError::Pattern {
        section: section.clone(),
        source,
    })?;

    // Helper resolution. A missing name is fatal in strict mode and skips
    // the route in lenient mode.
    macro_rules! resolve {
        ($field:expr, $lookup:ident, $kind:literal) => {
            match $field {
                Some(name) => match helpers.$lookup(name) {
                    Some(func) => Some((name.clone(), func.clone())),
                    None => {
                        if strict {
                            return Err(CompileError::UnknownHelper {
                                section,
                                kind: $kind,
                                helper: name.clone(),
                            });
                        }
                        tracing::warn!(
                            section = %section,
                            helper = %name,
                            kind = $kind,
                            "unknown helper, skipping route"
                        );
                        return Ok(None);
                    }
                },
                None => None,
            }
        };
    }

    let filter = resolve!(&config.filter, filter, "filter");
    let datamap = resolve!(&config.datamap, datamap, "datamap");
    let alldata = resolve!(&config.alldata, alldata, "alldata");

    let format = match &config.format {
        Some(FormatSpec::Template(template)) => Some(RouteFormat::Template(template.clone())),
        Some(FormatSpec::Function { function }) => match helpers.format(function) {
            Some(func) => Some(RouteFormat::Function {
                name: function.clone(),
                func: func.clone(),
            }),
            None => {
                if strict {
                    return Err(CompileError::UnknownHelper {
                        section,
                        kind: "format",
                        helper: function.clone(),
                    });
                }
                tracing::warn!(
                    section = %section,
                    helper = %function,
                    "unknown format helper, skipping route"
                );
                return Ok(None);
            }
        },
        None => None,
    };

    let targets = match &config.targets {
        TargetsSpec::Static(entries) => {
            match resolve_static(&section, entries, catalog, strict)? {
                Some(targets) => ResolvedTargets::Static(targets),
                None => return Ok(None),
            }
        }
        TargetsSpec::Template(template) => ResolvedTargets::Template(template.clone()),
        TargetsSpec::Computed { function } => match helpers.targets(function) {
            Some(func) => ResolvedTargets::Computed {
                name: function.clone(),
                func: func.clone(),
            },
            None => {
                if strict {
                    return Err(CompileError::UnknownHelper {
                        section,
                        kind: "targets",
                        helper: function.clone(),
                    });
                }
                tracing::warn!(
                    section = %section,
                    helper = %function,
                    "unknown targets helper, skipping route"
                );
                return Ok(None);
            }
        },
    };

    Ok(Some(Route {
        name: section,
        pattern,
        targets,
        filter,
        datamap,
        alldata,
        format,
        title: config.title.clone(),
        priority: config.priority.clone(),
        retry: config.retry,
        qos: config.qos.unwrap_or(0),
        ignore_retained: config.ignore_retained,
    }))
}

/// Validate a static target list at compile time
///
/// `Ok(None)` means every entry was invalid and the route should be skipped
/// (lenient mode only).
fn resolve_static(
    section: &str,
    entries: &[String],
    catalog: &dyn TargetCatalog,
    strict: bool,
) -> Result<Option<Vec<Target>>, CompileError> {
    let mut targets = Vec::with_capacity(entries.len());

    for entry in entries {
        let (service, target) = match entry.split_once(':') {
            Some(pair) => pair,
            None => (entry.as_str(), ""),
        };

        if !catalog.has_service(service) {
            if strict {
                return Err(CompileError::UnknownService {
                    section: section.to_string(),
                    service: service.to_string(),
                });
            }
            tracing::warn!(
                section = %section,
                service = %service,
                "route points to non-existing service, dropping entry"
            );
            continue;
        }

        if target.is_empty() {
            targets.extend(
                catalog
                    .service_targets(service)
                    .into_iter()
                    .map(|name| Target::new(service, name)),
            );
            continue;
        }

        if !catalog.has_target(service, target) {
            if strict {
                return Err(CompileError::UnknownTarget {
                    section: section.to_string(),
                    service: service.to_string(),
                    target: target.to_string(),
                });
            }
            tracing::warn!(
                section = %section,
                service = %service,
                target = %target,
                "route points to non-existing target, dropping entry"
            );
            continue;
        }

        targets.push(Target::new(service, target));
    }

    if targets.is_empty() {
        if strict {
            return Err(CompileError::NoValidTargets {
                section: section.to_string(),
            });
        }
        tracing::warn!(section = %section, "route has no valid targets, skipping route");
        return Ok(None);
    }

    Ok(Some(targets))
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
