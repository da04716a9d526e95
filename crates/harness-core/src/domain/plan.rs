//! What a run does: which backends, with which connections and ports, and
//! what the test suite is told about the server it should hit.

use rand::Rng;

use crate::domain::{AppInstance, Backend, DatabaseConfig, PortRange};

/// Environment variable through which the test suite learns the server port.
pub const DEFAULT_PORT_ENV: &str = "__PORT__";

/// One backend's slot in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPlan {
    pub database: DatabaseConfig,
    pub port: u16,
}

impl BackendPlan {
    pub fn new(database: DatabaseConfig, port: u16) -> Self {
        Self { database, port }
    }

    pub fn backend(&self) -> Backend {
        self.database.backend()
    }

    pub fn instance(&self, app_name: &str) -> AppInstance {
        AppInstance::new(app_name, self.backend(), self.port)
    }
}

/// Ordered list of backends to exercise, one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    backends: Vec<BackendPlan>,
}

impl RunPlan {
    pub fn new(backends: Vec<BackendPlan>) -> Self {
        Self { backends }
    }

    /// Plan over `databases`, drawing a fresh port for each from `ports`.
    ///
    /// Backends are ordered mongo, postgres, mysql regardless of the input
    /// order.
    pub fn with_random_ports<R: Rng + ?Sized>(
        databases: impl IntoIterator<Item = DatabaseConfig>,
        ports: PortRange,
        rng: &mut R,
    ) -> Self {
        let mut databases: Vec<_> = databases.into_iter().collect();
        databases.sort_by_key(DatabaseConfig::backend);
        let backends = databases
            .into_iter()
            .map(|db| {
                let port = ports.pick(rng);
                BackendPlan::new(db, port)
            })
            .collect();
        Self { backends }
    }

    pub fn backends(&self) -> &[BackendPlan] {
        &self.backends
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }
}

/// Explicit hand-off of the server port to the test suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    port: u16,
    port_env: String,
}

impl TestContext {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            port_env: DEFAULT_PORT_ENV.into(),
        }
    }

    pub fn with_port_env(mut self, name: impl Into<String>) -> Self {
        self.port_env = name.into();
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn port_env(&self) -> &str {
        &self.port_env
    }

    /// `(name, value)` pair to place in every test-runner child's environment.
    pub fn env_pair(&self) -> (String, String) {
        (self.port_env.clone(), self.port.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn random_plan_is_in_fixed_order() {
        let dbs = [Backend::Mysql, Backend::Mongo, Backend::Postgres]
            .map(DatabaseConfig::local_default);
        let mut rng = StdRng::seed_from_u64(1);
        let plan = RunPlan::with_random_ports(dbs, PortRange::default(), &mut rng);

        let order: Vec<_> = plan.backends().iter().map(BackendPlan::backend).collect();
        assert_eq!(order, Backend::ALL);
        assert!(
            plan.backends()
                .iter()
                .all(|b| PortRange::default().contains(b.port))
        );
    }

    #[test]
    fn instance_derives_directory() {
        let slot = BackendPlan::new(DatabaseConfig::local_default(Backend::Postgres), 2100);
        let app = slot.instance("testApp");
        assert_eq!(app.dir_name(), "testApp_pg");
        assert_eq!(app.port(), 2100);
    }

    #[test]
    fn test_context_env_pair() {
        let ctx = TestContext::new(4242);
        assert_eq!(ctx.env_pair(), ("__PORT__".to_string(), "4242".to_string()));
        let ctx = ctx.with_port_env("APP_PORT");
        assert_eq!(ctx.port_env(), "APP_PORT");
    }
}
