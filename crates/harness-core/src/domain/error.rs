// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports carry them across layers)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Unknown backend '{name}'")]
    UnknownBackend { name: String },

    #[error("Invalid port range {start}..{end}: {reason}")]
    InvalidPortRange { start: u16, end: u16, reason: String },

    #[error("Command has no program to run")]
    EmptyCommand,

    #[error("Marker must not be empty ({kind})")]
    EmptyMarker { kind: &'static str },

    // ========================================================================
    // Constraint Violations
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownBackend { name } => vec![
                format!("'{name}' is not a known backend"),
                "Known backends: mongo, postgres (pg), mysql".into(),
            ],
            Self::InvalidPortRange { start, end, .. } => vec![
                format!("Configured range: {start}..{end}"),
                "The start must be non-zero and lower than the end".into(),
                "Check [ports] in your configuration file".into(),
            ],
            Self::EmptyCommand => vec![
                "Set a program for the generator and test commands".into(),
                "Check [generator] and [tests] in your configuration file".into(),
            ],
            Self::EmptyMarker { kind } => vec![
                format!("The {kind} marker is empty and would match every line"),
                "Check [generator] in your configuration file".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownBackend { .. } => ErrorCategory::NotFound,
            Self::InvalidPortRange { .. } | Self::EmptyCommand | Self::EmptyMarker { .. } => {
                ErrorCategory::Validation
            }
            Self::MissingRequiredField { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Internal,
}
