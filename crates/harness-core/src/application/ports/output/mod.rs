//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the runner needs from the outside world.
//! The `harness-adapters` crate provides implementations.

use std::path::Path;

use crate::domain::{Backend, CommandSpec, ExitReport, OutputLine, Phase};
use crate::error::HarnessResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `harness_adapters::filesystem::LocalFilesystem` (production)
/// - `harness_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> HarnessResult<()>;

    /// Names of the immediate children of a directory, sorted.
    fn list_dir(&self, path: &Path) -> HarnessResult<Vec<String>>;
}

/// Port for starting child processes.
///
/// Implemented by:
/// - `harness_adapters::process::LocalSpawner` (OS processes)
/// - `harness_adapters::process::ScriptedSpawner` (testing)
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, spec: &CommandSpec) -> HarnessResult<Box<dyn ManagedProcess>>;
}

/// An owned, running child process.
///
/// Whoever holds the handle is responsible for terminating it. Dropping a
/// handle whose process is still alive must kill and reap it.
pub trait ManagedProcess: Send {
    /// OS process id, if the process has one.
    fn id(&self) -> Option<u32>;

    /// Block until the next line of output. `None` once both streams are
    /// closed or output has been detached.
    fn next_line(&mut self) -> Option<OutputLine>;

    /// Stop delivering output through [`Self::next_line`]. The process keeps
    /// running and its pipes keep draining.
    fn detach_output(&mut self);

    /// Terminate the process and reap it. Killing an already exited process
    /// is not an error.
    fn kill(&mut self) -> HarnessResult<()>;

    /// Wait for the process to exit on its own.
    fn wait(&mut self) -> HarnessResult<ExitReport>;

    fn is_running(&mut self) -> bool;
}

/// Port for dropping leftover test databases.
///
/// Implemented by:
/// - `harness_adapters::database::MongoJanitor` (document store)
/// - `harness_adapters::database::MemoryJanitor` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait DatabaseJanitor: Send + Sync {
    /// Drop every database whose name contains `marker`; returns the names
    /// dropped.
    fn drop_matching(&self, marker: &str) -> HarnessResult<Vec<String>>;
}

/// Observer notified as each backend moves through its phases.
pub trait PhaseListener: Send + Sync {
    fn on_phase(&self, backend: Backend, phase: Phase);
}

/// Listener that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl PhaseListener for NoopListener {
    fn on_phase(&self, _backend: Backend, _phase: Phase) {}
}
