/// Database migration runner
///
/// Each backend has its own migration directory because column types differ
/// (`BIGSERIAL`/`TIMESTAMPTZ` on Postgres, `INTEGER PRIMARY KEY`/`TEXT` on
/// SQLite). The resulting tables have the same columns and the same meaning.
///
/// - `migrations/postgres/`
/// - `migrations/sqlite/`
///
/// # Example
///
/// ```no_run
/// use sqlopt_shared::db::pool::{create_pg_pool, DatabaseConfig};
/// use sqlopt_shared::db::migrations::{run_pg_migrations, pg_migration_status};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pg_pool(&config).await?;
///     run_pg_migrations(&pool).await?;
///
///     let status = pg_migration_status(&pool).await?;
///     println!("Applied {} migrations", status.applied_migrations);
///
///     Ok(())
/// }
/// ```

use sqlx::migrate::{MigrateDatabase, MigrateError};
use sqlx::{PgPool, Postgres, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use super::pool::DatabaseKind;

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version
    pub latest_version: Option<i64>,
}

/// Runs pending Postgres migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(backend = "postgres", "Starting database migrations");

    match sqlx::migrate!("./migrations/postgres").run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Runs pending SQLite migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply
pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    info!(backend = "sqlite", "Starting database migrations");

    match sqlx::migrate!("./migrations/sqlite").run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reads applied migrations on Postgres
pub async fn pg_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}

/// Reads applied migrations on SQLite
pub async fn sqlite_migration_status(pool: &SqlitePool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    if table_count == 0 {
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}

/// Creates the database if it doesn't exist
///
/// In-memory SQLite URLs are left alone.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    let exists = match DatabaseKind::from_url(database_url) {
        Some(DatabaseKind::Postgres) => Postgres::database_exists(database_url).await?,
        Some(DatabaseKind::Sqlite) if database_url.contains(":memory:") => return Ok(()),
        Some(DatabaseKind::Sqlite) => Sqlite::database_exists(database_url).await?,
        None => {
            return Err(sqlx::Error::Configuration(
                format!("unsupported database URL: {database_url}").into(),
            ))
        }
    };

    if exists {
        debug!("Database already exists");
        return Ok(());
    }

    info!("Database does not exist, creating it");
    match DatabaseKind::from_url(database_url) {
        Some(DatabaseKind::Postgres) => Postgres::create_database(database_url).await?,
        _ => Sqlite::create_database(database_url).await?,
    }
    info!("Database created successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_sqlite_pool, DatabaseConfig};

    #[tokio::test]
    async fn test_sqlite_migrations_apply_once() {
        let pool = create_sqlite_pool(&DatabaseConfig::in_memory()).await.unwrap();

        let before = sqlite_migration_status(&pool).await.unwrap();
        assert_eq!(before.applied_migrations, 0);
        assert!(before.latest_version.is_none());

        run_sqlite_migrations(&pool).await.unwrap();
        let first = sqlite_migration_status(&pool).await.unwrap();
        assert!(first.applied_migrations > 0);

        run_sqlite_migrations(&pool).await.unwrap();
        let second = sqlite_migration_status(&pool).await.unwrap();
        assert_eq!(first.applied_migrations, second.applied_migrations);
    }

    #[tokio::test]
    async fn test_ensure_in_memory_is_noop() {
        ensure_database_exists("sqlite::memory:").await.unwrap();
    }
}
