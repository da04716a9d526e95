//! Test database cleanup against a local MongoDB server.

use std::time::Duration;

use mongodb::sync::Client;
use tracing::{debug, info};

use harness_core::{
    application::{ApplicationError, ports::DatabaseJanitor},
    error::HarnessResult,
};

/// Default address of the local document database.
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// How long cleanup waits for a server before giving up.
pub const DEFAULT_SELECTION_TIMEOUT: Duration = Duration::from_secs(2);

const SELECTION_TIMEOUT_OPTION: &str = "serverSelectionTimeoutMS";

/// Drops leftover test databases through the synchronous MongoDB driver.
#[derive(Debug, Clone)]
pub struct MongoJanitor {
    uri: String,
    timeout: Duration,
}

impl MongoJanitor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            timeout: DEFAULT_SELECTION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The configured URI with the selection timeout appended, unless the
    /// URI already sets one.
    fn connection_uri(&self) -> String {
        if self.uri.contains(SELECTION_TIMEOUT_OPTION) {
            return self.uri.clone();
        }
        let has_path = self
            .uri
            .split_once("://")
            .is_some_and(|(_, rest)| rest.contains('/'));
        let separator = match (self.uri.contains('?'), has_path) {
            (true, _) => "&",
            (false, true) => "?",
            (false, false) => "/?",
        };
        format!(
            "{}{separator}{SELECTION_TIMEOUT_OPTION}={}",
            self.uri,
            self.timeout.as_millis()
        )
    }
}

impl Default for MongoJanitor {
    fn default() -> Self {
        Self::new(DEFAULT_MONGO_URI)
    }
}

impl DatabaseJanitor for MongoJanitor {
    fn drop_matching(&self, marker: &str) -> HarnessResult<Vec<String>> {
        let client = Client::with_uri_str(self.connection_uri()).map_err(cleanup_error)?;
        let names = client
            .list_database_names(None, None)
            .map_err(cleanup_error)?;

        let mut dropped = Vec::new();
        for name in names.into_iter().filter(|n| n.contains(marker)) {
            debug!(database = %name, "Dropping test database");
            client.database(&name).drop(None).map_err(cleanup_error)?;
            dropped.push(name);
        }

        info!(count = dropped.len(), uri = %self.uri, "Test databases dropped");
        Ok(dropped)
    }
}

fn cleanup_error(e: mongodb::error::Error) -> harness_core::error::HarnessError {
    ApplicationError::DatabaseCleanup {
        reason: e.to_string(),
    }
    .into()
}
