/// Database layer
///
/// Connection pooling and migrations for the two supported backends. Queries
/// live in [`crate::store`].
///
/// # Modules
///
/// - `pool`: Postgres and SQLite pool construction
/// - `migrations`: Per-backend migration runner
///
/// # Example
///
/// ```no_run
/// use sqlopt_shared::db::pool::{create_pg_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pg_pool(&config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
