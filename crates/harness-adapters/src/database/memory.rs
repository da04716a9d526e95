//! In-memory database janitor for testing.

use std::sync::{Arc, Mutex};

use harness_core::{
    application::{ApplicationError, ports::DatabaseJanitor},
    error::HarnessResult,
};

/// Fake janitor over a list of database names. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryJanitor {
    inner: Arc<Mutex<MemoryJanitorInner>>,
}

#[derive(Debug, Default)]
struct MemoryJanitorInner {
    databases: Vec<String>,
    unreachable: bool,
    calls: usize,
}

impl MemoryJanitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_databases<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let janitor = Self::default();
        if let Ok(mut inner) = janitor.inner.lock() {
            inner.databases = names.into_iter().map(Into::into).collect();
        }
        janitor
    }

    /// Every call fails as if the server were down.
    pub fn unreachable() -> Self {
        let janitor = Self::default();
        if let Ok(mut inner) = janitor.inner.lock() {
            inner.unreachable = true;
        }
        janitor
    }

    pub fn databases(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|i| i.databases.clone())
            .unwrap_or_default()
    }

    /// Number of `drop_matching` calls so far.
    pub fn calls(&self) -> usize {
        self.inner.lock().map(|i| i.calls).unwrap_or_default()
    }
}

impl DatabaseJanitor for MemoryJanitor {
    fn drop_matching(&self, marker: &str) -> HarnessResult<Vec<String>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ApplicationError::LockPoisoned)?;
        inner.calls += 1;

        if inner.unreachable {
            return Err(ApplicationError::DatabaseCleanup {
                reason: "connection refused".into(),
            }
            .into());
        }

        let (dropped, kept): (Vec<_>, Vec<_>) = inner
            .databases
            .drain(..)
            .partition(|name| name.contains(marker));
        inner.databases = kept;
        Ok(dropped)
    }
}
