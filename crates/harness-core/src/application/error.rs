//! Application layer errors.
//!
//! These errors represent failures while driving external processes and
//! resources, not violations of domain rules (those are `DomainError`).

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A child process could not be started.
    #[error("Failed to spawn '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    /// The generator reported that it could not reach the database.
    #[error("Project generation failed for {backend}: database connection has failed")]
    GenerationFailed { backend: String },

    /// The generated server printed a failure marker while booting.
    #[error("Server for {backend} reported a startup failure")]
    ServerFailed { backend: String },

    /// A child's output ended before it reported readiness.
    #[error("'{command}' exited before {waiting_for}")]
    ProcessExited {
        command: String,
        waiting_for: String,
    },

    /// A child process could not be terminated.
    #[error("Failed to kill process {pid:?}: {reason}")]
    KillFailed { pid: Option<u32>, reason: String },

    /// Waiting for a child process failed.
    #[error("Failed to wait for '{command}': {reason}")]
    WaitFailed { command: String, reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Test database cleanup failed.
    #[error("Database cleanup failed: {reason}")]
    DatabaseCleanup { reason: String },

    /// Shared state of an adapter was poisoned.
    #[error("Adapter state lock poisoned")]
    LockPoisoned,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::SpawnFailed { command, .. } => vec![
                format!("Could not start: {command}"),
                "Ensure the program is installed and in your PATH".into(),
                "Check [generator] and [tests] in your configuration file".into(),
            ],
            Self::GenerationFailed { backend } => vec![
                format!("Is the {backend} server running locally?"),
                "Check host, port and credentials under [databases]".into(),
            ],
            Self::ProcessExited { command, .. } => vec![
                format!("'{command}' stopped without printing its ready marker"),
                "Check the command output above for details".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::DatabaseCleanup { .. } => vec![
                "Is the document database running on its default port?".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SpawnFailed { .. } => ErrorCategory::Configuration,
            Self::GenerationFailed { .. }
            | Self::ProcessExited { .. }
            | Self::ServerFailed { .. }
            | Self::DatabaseCleanup { .. } => ErrorCategory::External,
            Self::KillFailed { .. }
            | Self::WaitFailed { .. }
            | Self::FilesystemError { .. }
            | Self::LockPoisoned => ErrorCategory::Internal,
        }
    }
}
