// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for the harness.
//!
//! Pure values and rules: which backends exist, what the generator is told,
//! which ports are legal, what an output line means. All process, filesystem
//! and database access goes through ports in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable values**: All domain objects are Clone + PartialEq
//!
pub mod backend;
pub mod command;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod plan;
pub mod probe;

pub use backend::{Backend, DEFAULT_DATABASE_NAME, DatabaseConfig, TEST_DATABASE_MARKER};
pub use command::{CommandSpec, ExitReport, OutputLine, Stream};
pub use error::{DomainError, ErrorCategory};
pub use instance::{AppInstance, DEFAULT_APP_NAME, PortRange, project_dir_name};
pub use lifecycle::{FAST_MODE_ENV, Phase, RunMode};
pub use plan::{BackendPlan, DEFAULT_PORT_ENV, RunPlan, TestContext};
pub use probe::{
    GENERATOR_FAILURE_MARKER, GENERATOR_READY_MARKER, OutputPredicate, ReadinessProbe,
    SERVER_READY_MARKER, Verdict,
};
