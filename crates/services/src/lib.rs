//! Courier - Services
//!
//! The notifier plugin contract and the registry of configured service
//! instances.
//!
//! # Architecture
//!
//! A *plugin* implements [`Notifier`] for one service kind (`log`, `file`,
//! `http`, ...). A *service instance* binds a plugin to a configuration
//! section: its options and its targets table. The [`ServiceRegistry`] holds
//! every instance and exposes `dispatch(job)` to the queue workers.
//!
//! ```text
//! [Worker] --Job--> [ServiceRegistry::dispatch] --> [Notifier::deliver]
//! ```
//!
//! # Plugin contract
//!
//! - `init` is called once at startup; it may open connections and validate
//!   configuration
//! - `deliver` is called per job and returns `Ok(true)` for delivered,
//!   `Ok(false)` for a retryable failure; `Err` is a plugin error carrying
//!   detail for the logs
//! - `deliver` runs under the engine's per-job timeout and inside its own
//!   task, so neither a hang nor a panic can take a queue worker down
//!
//! # Adding a plugin
//!
//! Implement [`Notifier`], then register an instance with the [`PluginSet`]
//! handed to the supervisor:
//!
//! ```ignore
//! let mut plugins = PluginSet::builtin();
//! plugins.register(Arc::new(MyNotifier::new()));
//! ```

mod context;
mod registry;

pub mod file;
pub mod http;
pub mod log;
pub mod null;

use async_trait::async_trait;
use courier_protocol::Job;
use thiserror::Error;

pub use context::ServiceContext;
pub use file::FileNotifier;
pub use http::HttpNotifier;
pub use log::LogNotifier;
pub use null::NullNotifier;
pub use registry::{PluginSet, ServiceRegistry};

/// Errors surfaced by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration names a plugin kind nothing is registered for
    #[error("service '{service}' uses unknown plugin kind '{kind}'")]
    UnknownKind {
        /// Service instance name
        service: String,
        /// The unknown kind
        kind: String,
    },

    /// A plugin's `init` hook failed
    #[error("service '{service}' failed to initialize: {detail}")]
    Init {
        /// Service instance name
        service: String,
        /// Failure detail
        detail: String,
    },

    /// A job addressed a target no service declares
    #[error("job addressed unknown target '{target}'")]
    UnknownTarget {
        /// The unresolvable address
        target: String,
    },

    /// A notifier did not return within the per-job timeout
    #[error("delivery to '{target}' timed out after {seconds}s")]
    Timeout {
        /// Target being delivered to
        target: String,
        /// Configured timeout
        seconds: u64,
    },

    /// A notifier failed with detail
    #[error("delivery to '{target}' failed: {detail}")]
    Delivery {
        /// Target being delivered to
        target: String,
        /// Failure detail
        detail: String,
    },

    /// A notifier panicked; the panic was contained
    #[error("plugin for '{target}' panicked: {detail}")]
    Panic {
        /// Target being delivered to
        target: String,
        /// Panic payload, stringified
        detail: String,
    },
}

/// A notifier plugin for one service kind
///
/// Implementations must be cheap to share: one instance serves every
/// service section of its kind, receiving the per-instance configuration
/// through the [`ServiceContext`].
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The plugin kind this notifier implements, e.g. `"log"`
    fn kind(&self) -> &'static str;

    /// One-time startup hook; may open connections and validate options
    async fn init(&self, _ctx: &ServiceContext) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Deliver one job
    ///
    /// `Ok(true)` means delivered; `Ok(false)` means failed but retryable.
    /// Errors are logged with full detail and treated like a failure.
    async fn deliver(&self, ctx: &ServiceContext, job: &Job) -> Result<bool, ServiceError>;
}
