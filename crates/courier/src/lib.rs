//! Courier daemon assembly
//!
//! The supervisor that wires configuration, helpers, plugins, dispatch,
//! scheduler and broker into a running engine. The binary in `main.rs` is a
//! thin CLI over this; integration tests drive [`Supervisor`] directly with
//! a stub broker.

pub mod samples;
pub mod supervisor;

pub use supervisor::{StartError, Supervisor};
