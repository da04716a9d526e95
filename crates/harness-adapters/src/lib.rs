//! Infrastructure adapters for the harness.
//!
//! This crate implements the ports defined in `harness-core::application::ports`.
//! It contains all external dependencies and I/O operations, plus in-memory
//! fakes of each port for tests.

pub mod database;
pub mod filesystem;
pub mod process;

// Re-export commonly used adapters
pub use database::{MemoryJanitor, MongoJanitor};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use process::{LocalSpawner, Script, ScriptedSpawner};
