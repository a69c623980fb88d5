/// SQLite backend
///
/// Used for single-node deployments and for tests, where
/// [`SqliteStore::in_memory`] gives each test a private database.

use sqlx::SqlitePool;
use tracing::info;

use super::{impl_store, StoreResult};
use crate::db::migrations::run_sqlite_migrations;
use crate::db::pool::{create_sqlite_pool, DatabaseConfig};

/// [`Store`](super::Store) over a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps an existing pool without running migrations
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = create_sqlite_pool(config).await?;
        run_sqlite_migrations(&pool).await?;
        info!(backend = "sqlite", "Store ready");
        Ok(Self { pool })
    }

    /// Fresh, migrated in-memory database
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect(&DatabaseConfig::in_memory()).await
    }
}

impl_store!(SqliteStore, "sqlite", crate::db::migrations::sqlite_migration_status);
