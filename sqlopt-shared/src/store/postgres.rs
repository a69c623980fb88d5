/// Postgres backend

use sqlx::PgPool;
use tracing::info;

use super::{impl_store, StoreResult};
use crate::db::migrations::run_pg_migrations;
use crate::db::pool::{create_pg_pool, DatabaseConfig};

/// [`Store`](super::Store) over a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool without running migrations
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and applies pending migrations
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = create_pg_pool(config).await?;
        run_pg_migrations(&pool).await?;
        info!(backend = "postgres", "Store ready");
        Ok(Self { pool })
    }
}

impl_store!(PgStore, "postgres", crate::db::migrations::pg_migration_status);
