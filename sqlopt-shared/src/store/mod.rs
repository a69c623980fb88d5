/// Persistence layer
///
/// The [`Store`] trait is the single seam between request handling and the
/// database. Two backends implement it:
///
/// - [`PgStore`](postgres::PgStore) over a `PgPool`
/// - [`SqliteStore`](sqlite::SqliteStore) over a `SqlitePool`
///
/// Both run the same SQL. Statements stick to the dialect both engines share:
/// `$N` placeholders, `RETURNING`, integer sums cast to `BIGINT`, and
/// timestamps always bound from Rust rather than defaulted by the database.
/// Every method is one auto-committing statement (or a few independent
/// reads); there are no multi-statement transactions.
///
/// # Example
///
/// ```no_run
/// use sqlopt_shared::db::pool::DatabaseConfig;
/// use sqlopt_shared::store;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = store::connect(&DatabaseConfig {
///     url: "sqlite::memory:".to_string(),
///     ..Default::default()
/// })
/// .await?;
///
/// store.health_check().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::migrations::{ensure_database_exists, MigrationStatus};
use crate::db::pool::{DatabaseConfig, DatabaseKind, PoolStats};
use crate::models::analytics::{
    LogTotals, TaskCount, UsageTotals, UserActivity, UserTaskCount, UserTotals,
};
use crate::models::query_history::{NewQueryHistory, QueryHistory};
use crate::models::query_log::{NewQueryLog, QueryLog};
use crate::models::user::{CreateUser, User, UserSummary};
use crate::models::user_schema::UserSchema;

pub mod postgres;
pub mod sqlite;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database URL scheme not recognized
    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository over users, query logs and query history
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name, "postgres" or "sqlite"
    fn backend(&self) -> &'static str;

    /// Runs `SELECT 1`
    async fn health_check(&self) -> StoreResult<()>;

    /// Connection pool usage
    fn pool_stats(&self) -> PoolStats;

    /// Applied migrations
    async fn migration_status(&self) -> StoreResult<MigrationStatus>;

    /// Closes the pool; later calls fail
    async fn close(&self);

    // Users

    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict("Email already exists")` on duplicate email
    async fn create_user(&self, user: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, email: &str) -> StoreResult<Option<User>>;

    /// All users, ordered by email
    async fn list_users(&self) -> StoreResult<Vec<UserSummary>>;

    /// Users without the stored admin flag, ordered by email
    async fn list_regular_users(&self) -> StoreResult<Vec<UserSummary>>;

    /// Sets the stored admin flag; returns `false` if no such user
    async fn set_admin(&self, email: &str, is_admin: bool) -> StoreResult<bool>;

    /// Replaces the password hash; returns `false` if no such user
    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<bool>;

    /// Deletes a user; logs and history rows are kept
    async fn delete_user(&self, email: &str) -> StoreResult<bool>;

    // Query logs

    async fn insert_query_log(&self, log: NewQueryLog) -> StoreResult<QueryLog>;

    /// Most recent log rows for one user
    async fn recent_logs_for_user(&self, email: &str, limit: i64) -> StoreResult<Vec<QueryLog>>;

    async fn log_totals_for_user(&self, email: &str) -> StoreResult<LogTotals>;

    // Query history

    async fn insert_history(&self, entry: NewQueryHistory) -> StoreResult<QueryHistory>;

    /// Finds a row owned by `owner`
    async fn find_history(&self, id: i64, owner: &str) -> StoreResult<Option<QueryHistory>>;

    /// Most recent rows for `owner`, newest first
    async fn list_history(&self, owner: &str, limit: i64) -> StoreResult<Vec<QueryHistory>>;

    /// Favorite rows for `owner`, newest first
    async fn list_favorites(&self, owner: &str) -> StoreResult<Vec<QueryHistory>>;

    /// Flips `is_favorite`; returns the new value, or `None` if not owned
    async fn toggle_favorite(&self, id: i64, owner: &str) -> StoreResult<Option<bool>>;

    /// Sets or clears the name; returns rows affected
    async fn rename_history(&self, id: i64, owner: &str, name: Option<&str>) -> StoreResult<u64>;

    /// Deletes a row; returns rows affected (0 for another user's row)
    async fn delete_history(&self, id: i64, owner: &str) -> StoreResult<u64>;

    // Natural-language schemas

    /// The owner's saved schema, if any
    async fn find_user_schema(&self, owner: &str) -> StoreResult<Option<UserSchema>>;

    /// Inserts or replaces the owner's schema
    async fn save_user_schema(&self, owner: &str, schema_text: &str) -> StoreResult<UserSchema>;

    /// Deletes the owner's schema; returns `false` if there was none
    async fn delete_user_schema(&self, owner: &str) -> StoreResult<bool>;

    // Analytics

    /// Whole-table totals; `active_since` bounds the active-user count
    async fn usage_totals(&self, active_since: DateTime<Utc>) -> StoreResult<UsageTotals>;

    /// Attempts per task, most used first
    async fn queries_by_task(&self) -> StoreResult<Vec<TaskCount>>;

    /// Log rows newer than `since`, newest first
    async fn recent_activity(&self, since: DateTime<Utc>, limit: i64) -> StoreResult<Vec<QueryLog>>;

    /// Users with the most attempts
    async fn top_users(&self, limit: i64) -> StoreResult<Vec<UserActivity>>;

    /// Most recent failed attempts
    async fn recent_errors(&self, limit: i64) -> StoreResult<Vec<QueryLog>>;

    /// Per-user totals for every registered user, most active first
    async fn user_totals(&self) -> StoreResult<Vec<UserTotals>>;

    /// Attempts per (user, task)
    async fn user_task_counts(&self) -> StoreResult<Vec<UserTaskCount>>;
}

/// Connects to the database named by `config.url`, runs migrations, and
/// returns the matching backend
///
/// # Errors
///
/// Returns an error if the URL scheme is unknown, the database is unreachable,
/// or a migration fails
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn Store>> {
    if DatabaseKind::from_url(&config.url).is_none() {
        return Err(StoreError::UnsupportedUrl(config.url.clone()));
    }
    ensure_database_exists(&config.url).await?;

    match DatabaseKind::from_url(&config.url) {
        Some(DatabaseKind::Postgres) => Ok(Arc::new(postgres::PgStore::connect(config).await?)),
        Some(DatabaseKind::Sqlite) => Ok(Arc::new(sqlite::SqliteStore::connect(config).await?)),
        None => Err(StoreError::UnsupportedUrl(config.url.clone())),
    }
}

/// Maps unique-constraint violations to `StoreError::Conflict`
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// Implements [`Store`] for a type with a `pool` field
///
/// Both backends share every statement, so the implementation is generated
/// once per pool type.
macro_rules! impl_store {
    ($store:ty, $backend:literal, $migration_status:path) => {
        #[async_trait::async_trait]
        impl $crate::store::Store for $store {
            fn backend(&self) -> &'static str {
                $backend
            }

            async fn health_check(&self) -> $crate::store::StoreResult<()> {
                let one: i64 = sqlx::query_scalar("SELECT CAST(1 AS BIGINT)")
                    .fetch_one(&self.pool)
                    .await?;
                if one == 1 {
                    Ok(())
                } else {
                    Err(sqlx::Error::Protocol("Health check returned unexpected value".into()).into())
                }
            }

            fn pool_stats(&self) -> $crate::db::pool::PoolStats {
                $crate::db::pool::get_pool_stats(&self.pool)
            }

            async fn migration_status(
                &self,
            ) -> $crate::store::StoreResult<$crate::db::migrations::MigrationStatus> {
                Ok($migration_status(&self.pool).await?)
            }

            async fn close(&self) {
                $crate::db::pool::close_pool(self.pool.clone()).await;
            }

            async fn create_user(
                &self,
                user: $crate::models::user::CreateUser,
            ) -> $crate::store::StoreResult<$crate::models::user::User> {
                sqlx::query_as::<_, $crate::models::user::User>(
                    r#"
                    INSERT INTO users (email, name, password_hash, is_admin, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING email, name, password_hash, is_admin, created_at
                    "#,
                )
                .bind(user.email)
                .bind(user.name)
                .bind(user.password_hash)
                .bind(user.is_admin)
                .bind(chrono::Utc::now())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| $crate::store::conflict_on_unique(e, "Email already exists"))
            }

            async fn find_user(
                &self,
                email: &str,
            ) -> $crate::store::StoreResult<Option<$crate::models::user::User>> {
                let user = sqlx::query_as::<_, $crate::models::user::User>(
                    r#"
                    SELECT email, name, password_hash, is_admin, created_at
                    FROM users
                    WHERE email = $1
                    "#,
                )
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

                Ok(user)
            }

            async fn list_users(
                &self,
            ) -> $crate::store::StoreResult<Vec<$crate::models::user::UserSummary>> {
                let users = sqlx::query_as::<_, $crate::models::user::UserSummary>(
                    "SELECT email, name, is_admin, created_at FROM users ORDER BY email",
                )
                .fetch_all(&self.pool)
                .await?;

                Ok(users)
            }

            async fn list_regular_users(
                &self,
            ) -> $crate::store::StoreResult<Vec<$crate::models::user::UserSummary>> {
                let users = sqlx::query_as::<_, $crate::models::user::UserSummary>(
                    r#"
                    SELECT email, name, is_admin, created_at
                    FROM users
                    WHERE is_admin = $1
                    ORDER BY email
                    "#,
                )
                .bind(false)
                .fetch_all(&self.pool)
                .await?;

                Ok(users)
            }

            async fn set_admin(&self, email: &str, is_admin: bool) -> $crate::store::StoreResult<bool> {
                let result = sqlx::query("UPDATE users SET is_admin = $1 WHERE email = $2")
                    .bind(is_admin)
                    .bind(email)
                    .execute(&self.pool)
                    .await?;

                Ok(result.rows_affected() > 0)
            }

            async fn update_password(
                &self,
                email: &str,
                password_hash: &str,
            ) -> $crate::store::StoreResult<bool> {
                let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
                    .bind(password_hash)
                    .bind(email)
                    .execute(&self.pool)
                    .await?;

                Ok(result.rows_affected() > 0)
            }

            async fn delete_user(&self, email: &str) -> $crate::store::StoreResult<bool> {
                let result = sqlx::query("DELETE FROM users WHERE email = $1")
                    .bind(email)
                    .execute(&self.pool)
                    .await?;

                Ok(result.rows_affected() > 0)
            }

            async fn insert_query_log(
                &self,
                log: $crate::models::query_log::NewQueryLog,
            ) -> $crate::store::StoreResult<$crate::models::query_log::QueryLog> {
                let row = sqlx::query_as::<_, $crate::models::query_log::QueryLog>(
                    r#"
                    INSERT INTO query_logs
                        (user_email, task_type, query_length, tokens_used, success, error_message, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id, user_email, task_type, query_length, tokens_used,
                              success, error_message, created_at
                    "#,
                )
                .bind(log.user_email)
                .bind(log.task_type)
                .bind(log.query_length)
                .bind(log.tokens_used)
                .bind(log.success)
                .bind(log.error_message)
                .bind(log.created_at)
                .fetch_one(&self.pool)
                .await?;

                Ok(row)
            }

            async fn recent_logs_for_user(
                &self,
                email: &str,
                limit: i64,
            ) -> $crate::store::StoreResult<Vec<$crate::models::query_log::QueryLog>> {
                let rows = sqlx::query_as::<_, $crate::models::query_log::QueryLog>(
                    r#"
                    SELECT id, user_email, task_type, query_length, tokens_used,
                           success, error_message, created_at
                    FROM query_logs
                    WHERE user_email = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(email)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn log_totals_for_user(
                &self,
                email: &str,
            ) -> $crate::store::StoreResult<$crate::models::analytics::LogTotals> {
                let (total_queries, successful_queries): (i64, i64) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*),
                           CAST(COALESCE(SUM(CASE WHEN success THEN 1 ELSE 0 END), 0) AS BIGINT)
                    FROM query_logs
                    WHERE user_email = $1
                    "#,
                )
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

                Ok($crate::models::analytics::LogTotals {
                    total_queries,
                    successful_queries,
                })
            }

            async fn insert_history(
                &self,
                entry: $crate::models::query_history::NewQueryHistory,
            ) -> $crate::store::StoreResult<$crate::models::query_history::QueryHistory> {
                let row = sqlx::query_as::<_, $crate::models::query_history::QueryHistory>(
                    r#"
                    INSERT INTO query_history
                        (user_email, query_text, task_type, result_text, is_favorite, query_name, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id, user_email, query_text, task_type, result_text,
                              is_favorite, query_name, created_at
                    "#,
                )
                .bind(entry.user_email)
                .bind(entry.query_text)
                .bind(entry.task_type)
                .bind(entry.result_text)
                .bind(false)
                .bind(entry.query_name)
                .bind(entry.created_at)
                .fetch_one(&self.pool)
                .await?;

                Ok(row)
            }

            async fn find_history(
                &self,
                id: i64,
                owner: &str,
            ) -> $crate::store::StoreResult<Option<$crate::models::query_history::QueryHistory>> {
                let row = sqlx::query_as::<_, $crate::models::query_history::QueryHistory>(
                    r#"
                    SELECT id, user_email, query_text, task_type, result_text,
                           is_favorite, query_name, created_at
                    FROM query_history
                    WHERE id = $1 AND user_email = $2
                    "#,
                )
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;

                Ok(row)
            }

            async fn list_history(
                &self,
                owner: &str,
                limit: i64,
            ) -> $crate::store::StoreResult<Vec<$crate::models::query_history::QueryHistory>> {
                let rows = sqlx::query_as::<_, $crate::models::query_history::QueryHistory>(
                    r#"
                    SELECT id, user_email, query_text, task_type, result_text,
                           is_favorite, query_name, created_at
                    FROM query_history
                    WHERE user_email = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(owner)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn list_favorites(
                &self,
                owner: &str,
            ) -> $crate::store::StoreResult<Vec<$crate::models::query_history::QueryHistory>> {
                let rows = sqlx::query_as::<_, $crate::models::query_history::QueryHistory>(
                    r#"
                    SELECT id, user_email, query_text, task_type, result_text,
                           is_favorite, query_name, created_at
                    FROM query_history
                    WHERE user_email = $1 AND is_favorite = $2
                    ORDER BY created_at DESC, id DESC
                    "#,
                )
                .bind(owner)
                .bind(true)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn toggle_favorite(
                &self,
                id: i64,
                owner: &str,
            ) -> $crate::store::StoreResult<Option<bool>> {
                let value: Option<bool> = sqlx::query_scalar(
                    r#"
                    UPDATE query_history
                    SET is_favorite = NOT is_favorite
                    WHERE id = $1 AND user_email = $2
                    RETURNING is_favorite
                    "#,
                )
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;

                Ok(value)
            }

            async fn rename_history(
                &self,
                id: i64,
                owner: &str,
                name: Option<&str>,
            ) -> $crate::store::StoreResult<u64> {
                let result = sqlx::query(
                    "UPDATE query_history SET query_name = $1 WHERE id = $2 AND user_email = $3",
                )
                .bind(name)
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await?;

                Ok(result.rows_affected())
            }

            async fn delete_history(&self, id: i64, owner: &str) -> $crate::store::StoreResult<u64> {
                let result = sqlx::query("DELETE FROM query_history WHERE id = $1 AND user_email = $2")
                    .bind(id)
                    .bind(owner)
                    .execute(&self.pool)
                    .await?;

                Ok(result.rows_affected())
            }

            async fn find_user_schema(
                &self,
                owner: &str,
            ) -> $crate::store::StoreResult<Option<$crate::models::user_schema::UserSchema>> {
                let row = sqlx::query_as::<_, $crate::models::user_schema::UserSchema>(
                    r#"
                    SELECT user_email, schema_text, created_at, updated_at
                    FROM user_schemas
                    WHERE user_email = $1
                    "#,
                )
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;

                Ok(row)
            }

            async fn save_user_schema(
                &self,
                owner: &str,
                schema_text: &str,
            ) -> $crate::store::StoreResult<$crate::models::user_schema::UserSchema> {
                let now = chrono::Utc::now();
                let row = sqlx::query_as::<_, $crate::models::user_schema::UserSchema>(
                    r#"
                    INSERT INTO user_schemas (user_email, schema_text, created_at, updated_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (user_email)
                    DO UPDATE SET schema_text = excluded.schema_text, updated_at = excluded.updated_at
                    RETURNING user_email, schema_text, created_at, updated_at
                    "#,
                )
                .bind(owner)
                .bind(schema_text)
                .bind(now)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;

                Ok(row)
            }

            async fn delete_user_schema(&self, owner: &str) -> $crate::store::StoreResult<bool> {
                let result = sqlx::query("DELETE FROM user_schemas WHERE user_email = $1")
                    .bind(owner)
                    .execute(&self.pool)
                    .await?;

                Ok(result.rows_affected() > 0)
            }

            async fn usage_totals(
                &self,
                active_since: chrono::DateTime<chrono::Utc>,
            ) -> $crate::store::StoreResult<$crate::models::analytics::UsageTotals> {
                let (total_queries, successful_queries, total_query_length, total_tokens): (i64, i64, i64, i64) =
                    sqlx::query_as(
                        r#"
                        SELECT COUNT(*),
                               CAST(COALESCE(SUM(CASE WHEN success THEN 1 ELSE 0 END), 0) AS BIGINT),
                               CAST(COALESCE(SUM(query_length), 0) AS BIGINT),
                               CAST(COALESCE(SUM(tokens_used), 0) AS BIGINT)
                        FROM query_logs
                        "#,
                    )
                    .fetch_one(&self.pool)
                    .await?;

                let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await?;

                let active_users: i64 = sqlx::query_scalar(
                    "SELECT COUNT(DISTINCT user_email) FROM query_logs WHERE created_at >= $1",
                )
                .bind(active_since)
                .fetch_one(&self.pool)
                .await?;

                Ok($crate::models::analytics::UsageTotals {
                    total_queries,
                    successful_queries,
                    total_query_length,
                    total_tokens,
                    total_users,
                    active_users,
                })
            }

            async fn queries_by_task(
                &self,
            ) -> $crate::store::StoreResult<Vec<$crate::models::analytics::TaskCount>> {
                let rows = sqlx::query_as::<_, $crate::models::analytics::TaskCount>(
                    r#"
                    SELECT task_type, COUNT(*) AS count
                    FROM query_logs
                    GROUP BY task_type
                    ORDER BY count DESC, task_type
                    "#,
                )
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn recent_activity(
                &self,
                since: chrono::DateTime<chrono::Utc>,
                limit: i64,
            ) -> $crate::store::StoreResult<Vec<$crate::models::query_log::QueryLog>> {
                let rows = sqlx::query_as::<_, $crate::models::query_log::QueryLog>(
                    r#"
                    SELECT id, user_email, task_type, query_length, tokens_used,
                           success, error_message, created_at
                    FROM query_logs
                    WHERE created_at >= $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(since)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn top_users(
                &self,
                limit: i64,
            ) -> $crate::store::StoreResult<Vec<$crate::models::analytics::UserActivity>> {
                let rows = sqlx::query_as::<_, $crate::models::analytics::UserActivity>(
                    r#"
                    SELECT l.user_email AS user_email,
                           COALESCE(u.name, l.user_email) AS name,
                           COUNT(*) AS query_count
                    FROM query_logs l
                    LEFT JOIN users u ON u.email = l.user_email
                    GROUP BY l.user_email, u.name
                    ORDER BY query_count DESC, l.user_email
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn recent_errors(
                &self,
                limit: i64,
            ) -> $crate::store::StoreResult<Vec<$crate::models::query_log::QueryLog>> {
                let rows = sqlx::query_as::<_, $crate::models::query_log::QueryLog>(
                    r#"
                    SELECT id, user_email, task_type, query_length, tokens_used,
                           success, error_message, created_at
                    FROM query_logs
                    WHERE success = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(false)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn user_totals(
                &self,
            ) -> $crate::store::StoreResult<Vec<$crate::models::analytics::UserTotals>> {
                let rows = sqlx::query_as::<_, $crate::models::analytics::UserTotals>(
                    r#"
                    SELECT u.email AS email,
                           u.name AS name,
                           u.is_admin AS is_admin,
                           COUNT(l.id) AS total_queries,
                           CAST(COALESCE(SUM(CASE WHEN l.success THEN 1 ELSE 0 END), 0) AS BIGINT)
                               AS successful_queries,
                           MAX(l.created_at) AS last_activity
                    FROM users u
                    LEFT JOIN query_logs l ON l.user_email = u.email
                    GROUP BY u.email, u.name, u.is_admin
                    ORDER BY total_queries DESC, u.email
                    "#,
                )
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }

            async fn user_task_counts(
                &self,
            ) -> $crate::store::StoreResult<Vec<$crate::models::analytics::UserTaskCount>> {
                let rows = sqlx::query_as::<_, $crate::models::analytics::UserTaskCount>(
                    r#"
                    SELECT user_email, task_type, COUNT(*) AS count
                    FROM query_logs
                    GROUP BY user_email, task_type
                    ORDER BY user_email, count DESC, task_type
                    "#,
                )
                .fetch_all(&self.pool)
                .await?;

                Ok(rows)
            }
        }
    };
}

pub(crate) use impl_store;
