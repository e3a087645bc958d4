//! Target expansion
//!
//! Resolves a route's target specification into the concrete
//! `(service, target)` list for one message. An entirely invalid spec never
//! crashes the engine: bad entries are logged and dropped, and the message
//! proceeds for any valid siblings.

use courier_protocol::{Target, TransformContext};

use crate::helpers::{HelperOutcome, TargetsArgs};
use crate::route::{ResolvedTargets, Route};
use crate::template;

/// Read-only view of the declared services and their targets
///
/// Implemented by the service registry; the pipeline validates expanded
/// addresses against it without depending on the plugin machinery.
pub trait TargetCatalog: Send + Sync {
    /// Whether a service with this name is declared
    fn has_service(&self, service: &str) -> bool;

    /// Whether this service declares this target
    fn has_target(&self, service: &str, target: &str) -> bool;

    /// Names of every target the service declares
    fn service_targets(&self, service: &str) -> Vec<String>;

    /// Every declared `service:target` address
    fn all_addresses(&self) -> Vec<String>;
}

/// Resolve one textual address against the catalog
///
/// `service:target` yields that pair; a bare `service` fans out to every
/// declared target of that service. Unknown names are logged and yield
/// nothing.
pub fn resolve_address(section: &str, address: &str, catalog: &dyn TargetCatalog) -> Vec<Target> {
    let (service, target) = match address.split_once(':') {
        Some(pair) => pair,
        None => (address, ""),
    };

    if !catalog.has_service(service) {
        tracing::warn!(
            section = %section,
            service = %service,
            "target references non-existing service, skipping"
        );
        return Vec::new();
    }

    if target.is_empty() {
        // Service shorthand: notify every target of the service.
        return catalog
            .service_targets(service)
            .into_iter()
            .map(|name| Target::new(service, name))
            .collect();
    }

    if !catalog.has_target(service, target) {
        tracing::warn!(
            section = %section,
            service = %service,
            target = %target,
            "target references non-existing target, skipping"
        );
        return Vec::new();
    }

    vec![Target::new(service, target)]
}

/// Expand a route's targets for one message
///
/// Returns the concrete target list; an empty list drops the message for
/// this route (already logged).
pub fn expand_targets(
    route: &Route,
    context: &TransformContext,
    catalog: &dyn TargetCatalog,
) -> Vec<Target> {
    match &route.targets {
        ResolvedTargets::Static(targets) => targets.clone(),

        ResolvedTargets::Template(template) => {
            let address = match template::render_strict(template, context) {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!(
                        section = %route.name,
                        template = %template,
                        error = %e,
                        "cannot interpolate target template, dropping message"
                    );
                    return Vec::new();
                }
            };
            resolve_address(&route.name, &address, catalog)
        }

        ResolvedTargets::Computed { name, func } => {
            let known = catalog.all_addresses();
            let outcome = func(TargetsArgs {
                topic: context
                    .get("topic")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default(),
                context,
                section: &route.name,
                known_targets: &known,
            });

            match outcome {
                HelperOutcome::Keep(addresses) => {
                    let targets: Vec<Target> = addresses
                        .iter()
                        .flat_map(|a| resolve_address(&route.name, a, catalog))
                        .collect();
                    if targets.is_empty() {
                        tracing::warn!(
                            section = %route.name,
                            helper = %name,
                            "targets helper produced no valid targets"
                        );
                    }
                    targets
                }
                HelperOutcome::Drop => {
                    tracing::debug!(
                        section = %route.name,
                        helper = %name,
                        "targets helper dropped message"
                    );
                    Vec::new()
                }
                HelperOutcome::Error(detail) => {
                    tracing::warn!(
                        section = %route.name,
                        helper = %name,
                        error = %detail,
                        "targets helper failed, dropping message"
                    );
                    Vec::new()
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "expander_test.rs"]
mod tests;
