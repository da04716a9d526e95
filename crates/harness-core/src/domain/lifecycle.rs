//! Per-backend lifecycle phases and the run mode.

use std::fmt;

/// Environment variable that switches fast mode on.
pub const FAST_MODE_ENV: &str = "npm_config_fast";

/// Where a backend is in its lifecycle.
///
/// There is exactly one forward path and no way back:
/// `Idle → Cleaning → Generating → Starting → Testing → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Idle,
    Cleaning,
    Generating,
    Starting,
    Testing,
    Stopped,
}

impl Phase {
    /// Next phase on the forward path; `Stopped` is terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Cleaning),
            Self::Cleaning => Some(Self::Generating),
            Self::Generating => Some(Self::Starting),
            Self::Starting => Some(Self::Testing),
            Self::Testing => Some(Self::Stopped),
            Self::Stopped => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cleaning => "cleaning",
            Self::Generating => "generating",
            Self::Starting => "starting",
            Self::Testing => "testing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether cleanup and regeneration are skipped.
///
/// Resolved once at startup and passed by value; never mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    fast: bool,
}

impl RunMode {
    pub const fn normal() -> Self {
        Self { fast: false }
    }

    /// Reuse previously generated projects.
    pub const fn fast() -> Self {
        Self { fast: true }
    }

    /// Interpret the raw value of [`FAST_MODE_ENV`]; only the literal
    /// `"true"` enables fast mode.
    pub fn from_env_value(value: Option<&str>) -> Self {
        Self {
            fast: value == Some("true"),
        }
    }

    pub const fn is_fast(self) -> bool {
        self.fast
    }
}
