//! Readiness probes over a child process's output.
//!
//! The runner never looks at marker strings directly; it asks an
//! [`OutputPredicate`] what a line means. [`ReadinessProbe`] is the
//! substring-marker implementation used for both the generator and the
//! generated server.

use crate::domain::DomainError;

/// Printed by the generator once the new project is usable.
pub const GENERATOR_READY_MARKER: &str = "is ready at";

/// Printed by the generator when it cannot reach the database.
pub const GENERATOR_FAILURE_MARKER: &str = "Database connection has failed";

/// Printed by the generated server once it accepts requests.
pub const SERVER_READY_MARKER: &str = "To shut down your server";

/// What a single output line says about the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing decisive yet; keep reading.
    Pending,
    Ready,
    Failed,
}

/// Classifies output lines of a child process.
pub trait OutputPredicate: Send + Sync {
    fn classify(&self, line: &str) -> Verdict;
}

impl<F> OutputPredicate for F
where
    F: Fn(&str) -> Verdict + Send + Sync,
{
    fn classify(&self, line: &str) -> Verdict {
        self(line)
    }
}

/// Case-sensitive substring matcher with ready and failure markers.
///
/// Ready markers are checked first, so a line carrying both resolves as
/// ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessProbe {
    ready: Vec<String>,
    failure: Vec<String>,
}

impl ReadinessProbe {
    pub fn new(ready: impl Into<String>) -> Self {
        Self {
            ready: vec![ready.into()],
            failure: Vec::new(),
        }
    }

    /// Probe used while the generator scaffolds a project.
    pub fn generator() -> Self {
        Self::new(GENERATOR_READY_MARKER).with_failure(GENERATOR_FAILURE_MARKER)
    }

    /// Probe used while the generated server boots.
    pub fn server() -> Self {
        Self::new(SERVER_READY_MARKER)
    }

    pub fn with_ready(mut self, marker: impl Into<String>) -> Self {
        self.ready.push(marker.into());
        self
    }

    pub fn with_failure(mut self, marker: impl Into<String>) -> Self {
        self.failure.push(marker.into());
        self
    }

    /// Reject empty markers; an empty marker matches every line.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.ready.is_empty() {
            return Err(DomainError::MissingRequiredField {
                field: "ready marker",
            });
        }
        if self.ready.iter().any(String::is_empty) {
            return Err(DomainError::EmptyMarker { kind: "ready" });
        }
        if self.failure.iter().any(String::is_empty) {
            return Err(DomainError::EmptyMarker { kind: "failure" });
        }
        Ok(())
    }

    pub fn ready_markers(&self) -> &[String] {
        &self.ready
    }

    pub fn failure_markers(&self) -> &[String] {
        &self.failure
    }
}

impl OutputPredicate for ReadinessProbe {
    fn classify(&self, line: &str) -> Verdict {
        if self.ready.iter().any(|m| line.contains(m.as_str())) {
            Verdict::Ready
        } else if self.failure.iter().any(|m| line.contains(m.as_str())) {
            Verdict::Failed
        } else {
            Verdict::Pending
        }
    }
}
