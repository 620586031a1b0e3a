use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{ResultEngine, RetryPolicy};

mod definitions;
mod materialize;
mod select;
mod tick;
mod transactions;
mod wallets;

pub use materialize::MaterializationOutcome;
pub use tick::TickSummary;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Tunables for materialization work.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Retry policy for transient persistence failures.
    pub retry: RetryPolicy,
    /// Number of definitions materialized concurrently within one tick.
    pub workers: usize,
    /// Soft per-definition timeout; a hung item is logged and skipped
    /// rather than stalling the whole tick.
    pub item_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            workers: 1,
            item_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Per-definition exclusive holds.
///
/// Sqlite has no row-level `SELECT ... FOR UPDATE`, so the single-writer
/// guarantee for the read-check-write sequence comes from these async
/// mutexes; the database transaction supplies atomicity.
#[derive(Debug, Default)]
struct LockRegistry {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockRegistry {
    fn lock_for(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        map.entry(id).or_default().clone()
    }

    /// Drop the entry once no task holds its `Arc` anymore, so the map
    /// does not grow with every definition ever touched.
    fn release(&self, id: Uuid) {
        let mut map = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(entry) = map.get(&id)
            && Arc::strong_count(entry) == 1
        {
            map.remove(&id);
        }
    }
}

#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
    locks: Arc<LockRegistry>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn definition_lock(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock_for(id)
    }

    /// Callers drop their guard and `Arc` first.
    pub(crate) fn release_definition_lock(&self, id: Uuid) {
        self.locks.release(id);
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            config: self.config,
            locks: Arc::new(LockRegistry::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lock_registry_evicts_uncontended_entries() {
        let registry = LockRegistry::default();
        let id = Uuid::new_v4();

        let lock = registry.lock_for(id);
        let guard = lock.lock().await;
        // A contender still holding the Arc keeps the entry alive.
        let contender = registry.lock_for(id);

        drop(guard);
        drop(lock);
        registry.release(id);
        assert_eq!(registry.inner.lock().unwrap().len(), 1);

        drop(contender);
        registry.release(id);
        assert!(registry.inner.lock().unwrap().is_empty());
    }
}
