//! Database backends and the connection arguments handed to the generator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Substring shared by every database the harness creates.
///
/// Document-store cleanup drops any database whose name contains it.
pub const TEST_DATABASE_MARKER: &str = "strapi-test-";

/// Base database name before any per-run suffix is applied.
pub const DEFAULT_DATABASE_NAME: &str = "strapi-test";

/// One of the database engines the generated project can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Document store.
    Mongo,
    /// Relational.
    Postgres,
    /// Relational.
    Mysql,
}

impl Backend {
    /// Every backend, in the order a full run visits them.
    pub const ALL: [Backend; 3] = [Backend::Mongo, Backend::Postgres, Backend::Mysql];

    /// Value passed to the generator's `--dbclient` flag.
    pub const fn client(self) -> &'static str {
        match self {
            Self::Mongo => "mongo",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }

    /// Short label used in project directory names (`testApp_pg`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mongo => "mongo",
            Self::Postgres => "pg",
            Self::Mysql => "mysql",
        }
    }

    pub const fn is_document_store(self) -> bool {
        matches!(self, Self::Mongo)
    }

    /// Default port of the engine's local server.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Mongo => 27017,
            Self::Postgres => 5432,
            Self::Mysql => 3306,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.client())
    }
}

impl FromStr for Backend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            _ => Err(DomainError::UnknownBackend { name: s.into() }),
        }
    }
}

/// Connection arguments for one backend.
///
/// Immutable once built; the run plan owns one per backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    backend: Backend,
    host: String,
    port: u16,
    database: String,
    username: String,
    password: String,
}

impl DatabaseConfig {
    /// Connection to `host:port/database` with empty credentials.
    pub fn new(
        backend: Backend,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            host: host.into(),
            port,
            database: database.into(),
            username: String::new(),
            password: String::new(),
        }
    }

    /// Local defaults used when no configuration overrides them.
    ///
    /// MySQL is the only engine that ships with credentials (`root`/`root`).
    pub fn local_default(backend: Backend) -> Self {
        let config = Self::new(
            backend,
            "127.0.0.1",
            backend.default_port(),
            DEFAULT_DATABASE_NAME,
        );
        match backend {
            Backend::Mysql => config.with_credentials("root", "root"),
            Backend::Mongo | Backend::Postgres => config,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Append `-<stamp>` to the database name.
    ///
    /// The resulting name contains [`TEST_DATABASE_MARKER`] when the base
    /// name is [`DEFAULT_DATABASE_NAME`], so the next run's cleanup finds it.
    pub fn with_unique_suffix(mut self, stamp: i64) -> Self {
        self.database = format!("{}-{stamp}", self.database);
        self
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Flags handed to the generator's `new` command.
    ///
    /// Empty credentials are passed as empty values (`--dbusername=`).
    pub fn generator_args(&self) -> Vec<String> {
        vec![
            format!("--dbclient={}", self.backend.client()),
            format!("--dbhost={}", self.host),
            format!("--dbport={}", self.port),
            format!("--dbname={}", self.database),
            format!("--dbusername={}", self.username),
            format!("--dbpassword={}", self.password),
        ]
    }
}
