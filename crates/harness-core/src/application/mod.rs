//! Application layer for the harness.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (TestRunner)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer sequences the lifecycle; the values it works with
//! live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{BackendReport, RunReport, RunnerSettings, SuiteSummary, TestRunner};

pub use ports::{
    DatabaseJanitor, Filesystem, ManagedProcess, NoopListener, PhaseListener, ProcessSpawner,
};

pub use error::ApplicationError;
