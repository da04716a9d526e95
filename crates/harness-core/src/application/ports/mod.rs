//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `harness-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: project directory checks and removal
//!   - `ProcessSpawner` / `ManagedProcess`: generator, server and test-runner children
//!   - `DatabaseJanitor`: test database cleanup
//!   - `PhaseListener`: progress notifications

pub mod output;

pub use output::{
    DatabaseJanitor, Filesystem, ManagedProcess, NoopListener, PhaseListener, ProcessSpawner,
};

#[cfg(test)]
pub use output::{MockDatabaseJanitor, MockFilesystem};
