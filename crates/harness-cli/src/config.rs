//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only ever sees the
//! [`RunnerSettings`] and [`DatabaseConfig`] values derived from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `HARNESS__<SECTION>__<KEY>`, e.g.
//!    `HARNESS__PORTS__START=2000`
//! 3. `./.e2e-harness.toml`, then the user config file (or `--config`)
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use harness_adapters::database::{DEFAULT_MONGO_URI, DEFAULT_SELECTION_TIMEOUT};
use harness_core::{
    application::RunnerSettings,
    domain::{
        Backend, CommandSpec, DEFAULT_APP_NAME, DEFAULT_PORT_ENV,
        DatabaseConfig, GENERATOR_FAILURE_MARKER, GENERATOR_READY_MARKER, PortRange,
        ReadinessProbe, RunMode, SERVER_READY_MARKER, TEST_DATABASE_MARKER,
    },
    error::HarnessError,
};

use crate::error::{CliError, CliResult};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "HARNESS";

/// Config file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".e2e-harness.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where projects are generated and which packages get tested.
    pub app: AppSection,
    /// Generator command and its output markers.
    pub generator: GeneratorSection,
    /// Test-runner command.
    pub tests: TestsSection,
    /// Server port range.
    pub ports: PortsSection,
    /// Document database used for test database cleanup.
    pub mongo: MongoSection,
    /// Connection settings handed to the generator.
    pub databases: DatabasesSection,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    pub name: String,
    pub workspace_root: PathBuf,
    pub packages_dir: PathBuf,
    pub package_marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSection {
    pub program: String,
    pub args: Vec<String>,
    pub ready_marker: String,
    pub failure_marker: String,
    pub server_ready_marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestsSection {
    pub program: String,
    pub args: Vec<String>,
    pub port_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortsSection {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoSection {
    pub uri: String,
    pub test_prefix: String,
    /// Server selection timeout for cleanup, in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabasesSection {
    pub mongo: DatabaseSection,
    pub postgres: DatabaseSection,
    pub mysql: DatabaseSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    /// Mirror child process output to the terminal.
    pub echo_children: bool,
}

impl From<DatabaseConfig> for DatabaseSection {
    fn from(db: DatabaseConfig) -> Self {
        Self {
            host: db.host().to_owned(),
            port: db.port(),
            name: db.database().to_owned(),
            username: db.username().to_owned(),
            password: db.password().to_owned(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection {
                name: DEFAULT_APP_NAME.into(),
                workspace_root: PathBuf::from("."),
                packages_dir: PathBuf::from("packages"),
                package_marker: "strapi".into(),
            },
            generator: GeneratorSection {
                program: "node".into(),
                args: vec!["packages/strapi/bin/strapi.js".into()],
                ready_marker: GENERATOR_READY_MARKER.into(),
                failure_marker: GENERATOR_FAILURE_MARKER.into(),
                server_ready_marker: SERVER_READY_MARKER.into(),
            },
            tests: TestsSection {
                program: "npx".into(),
                args: vec!["jest".into(), "--passWithNoTests".into(), "--verbose".into()],
                port_env: DEFAULT_PORT_ENV.into(),
            },
            ports: PortsSection {
                start: PortRange::default().start(),
                end: PortRange::default().end(),
            },
            mongo: MongoSection {
                uri: DEFAULT_MONGO_URI.into(),
                test_prefix: TEST_DATABASE_MARKER.into(),
                timeout_ms: DEFAULT_SELECTION_TIMEOUT.as_millis() as u64,
            },
            databases: DatabasesSection {
                mongo: DatabaseConfig::local_default(Backend::Mongo).into(),
                postgres: DatabaseConfig::local_default(Backend::Postgres).into(),
                mysql: DatabaseConfig::local_default(Backend::Mysql).into(),
            },
            output: OutputConfig {
                no_color: false,
                echo_children: true,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then files, then environment.
    ///
    /// An explicit `config_file` must exist; the default locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> CliResult<Self> {
        let defaults = Config::try_from(&Self::default()).map_err(config_error)?;
        let mut builder = Config::builder().add_source(defaults);

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path.as_path()).required(true)),
            None => builder
                .add_source(File::from(Self::config_path()).required(false))
                .add_source(File::from(Path::new(LOCAL_CONFIG_FILE)).required(false)),
        };

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(config_error)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.e2e-harness.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "e2e-harness", "e2e-harness")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    pub fn port_range(&self) -> CliResult<PortRange> {
        PortRange::new(self.ports.start, self.ports.end)
            .map_err(|e| CliError::Core(HarnessError::from(e)))
    }

    /// Connection settings for `backend`.
    pub fn database(&self, backend: Backend) -> DatabaseConfig {
        let section = match backend {
            Backend::Mongo => &self.databases.mongo,
            Backend::Postgres => &self.databases.postgres,
            Backend::Mysql => &self.databases.mysql,
        };
        DatabaseConfig::new(backend, &section.host, section.port, &section.name)
            .with_credentials(&section.username, &section.password)
    }

    /// Runner settings for one invocation.
    pub fn runner_settings(&self, mode: RunMode) -> CliResult<RunnerSettings> {
        let generator = CommandSpec::from_parts(&self.generator.program, &self.generator.args)
            .map_err(|e| CliError::Core(e.into()))?;
        let test_command = CommandSpec::from_parts(&self.tests.program, &self.tests.args)
            .map_err(|e| CliError::Core(e.into()))?;

        let settings = RunnerSettings {
            app_name: self.app.name.clone(),
            workspace_root: self.app.workspace_root.clone(),
            packages_dir: self.app.packages_dir.clone(),
            package_marker: self.app.package_marker.clone(),
            generator,
            test_command,
            port_env: self.tests.port_env.clone(),
            test_database_marker: self.mongo.test_prefix.clone(),
            generator_probe: ReadinessProbe::new(&self.generator.ready_marker)
                .with_failure(&self.generator.failure_marker),
            server_probe: ReadinessProbe::new(&self.generator.server_ready_marker),
            mode,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn config_error(e: config::ConfigError) -> CliError {
    CliError::ConfigError {
        message: e.to_string(),
        source: Some(Box::new(e)),
    }
}
