//! Route compilation errors

use thiserror::Error;

/// Errors raised while compiling configuration into a route table
///
/// In lenient mode most of these degrade to a logged warning and a skipped
/// route; in strict mode they are fatal configuration errors.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A route declares a malformed topic pattern
    #[error("route '{section}' has invalid topic pattern: {source}")]
    Pattern {
        /// Name of the offending route section
        section: String,
        /// Underlying pattern error
        #[source]
        source: courier_routing::PatternError,
    },

    /// A route references a helper name absent from the registry
    #[error("route '{section}' references unknown {kind} helper '{helper}'")]
    UnknownHelper {
        /// Name of the offending route section
        section: String,
        /// Helper kind (filter, datamap, alldata, format, targets)
        kind: &'static str,
        /// The missing helper name
        helper: String,
    },

    /// A route references a service that is not declared
    #[error("route '{section}' references unknown service '{service}'")]
    UnknownService {
        /// Name of the offending route section
        section: String,
        /// The missing service name
        service: String,
    },

    /// A route references a target missing from its service's targets table
    #[error("route '{section}' references unknown target '{target}' in service '{service}'")]
    UnknownTarget {
        /// Name of the offending route section
        section: String,
        /// Service the target was looked up in
        service: String,
        /// The missing target name
        target: String,
    },

    /// After dropping invalid entries, a route has no targets left
    #[error("route '{section}' has no valid targets")]
    NoValidTargets {
        /// Name of the offending route section
        section: String,
    },
}
