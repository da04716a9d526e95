//! Generated application instances and the ports they listen on.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Backend, DomainError};

/// Base name of every generated project.
pub const DEFAULT_APP_NAME: &str = "testApp";

/// Directory name of the project generated for `backend`: `<app_name>_<label>`.
pub fn project_dir_name(app_name: &str, backend: Backend) -> String {
    format!("{app_name}_{}", backend.label())
}

/// A generated project and the port its server is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInstance {
    backend: Backend,
    dir_name: String,
    port: u16,
}

impl AppInstance {
    pub fn new(app_name: &str, backend: Backend, port: u16) -> Self {
        Self {
            backend,
            dir_name: project_dir_name(app_name, backend),
            port,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Flags handed to the generator's `start` command.
    pub fn start_args(&self) -> Vec<String> {
        vec![
            format!("--path={}", self.dir_name),
            format!("--port={}", self.port),
        ]
    }
}

impl fmt::Display for AppInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.dir_name, self.port)
    }
}

/// Half-open range `[start, end)` from which server ports are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, DomainError> {
        if start == 0 {
            return Err(DomainError::InvalidPortRange {
                start,
                end,
                reason: "port 0 is reserved".into(),
            });
        }
        if start >= end {
            return Err(DomainError::InvalidPortRange {
                start,
                end,
                reason: "range is empty".into(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..self.end).contains(&port)
    }

    /// Draw a port uniformly from the range.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> u16 {
        rng.gen_range(self.start..self.end)
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: 1500,
            end: 4500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn dir_name_uses_backend_label() {
        assert_eq!(project_dir_name("testApp", Backend::Postgres), "testApp_pg");
        assert_eq!(project_dir_name("testApp", Backend::Mongo), "testApp_mongo");
    }

    #[test]
    fn start_args_point_at_project() {
        let app = AppInstance::new("testApp", Backend::Postgres, 3001);
        assert_eq!(app.start_args(), vec!["--path=testApp_pg", "--port=3001"]);
        assert_eq!(app.to_string(), "testApp_pg@3001");
    }

    #[test]
    fn picked_ports_stay_in_range() {
        let range = PortRange::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let port = range.pick(&mut rng);
            assert!(range.contains(port), "{port} escaped {range:?}");
        }
    }

    #[test]
    fn empty_range_rejected() {
        assert!(matches!(
            PortRange::new(3000, 3000),
            Err(DomainError::InvalidPortRange { .. })
        ));
        assert!(PortRange::new(0, 10).is_err());
        assert!(PortRange::new(10, 11).is_ok());
    }
}
