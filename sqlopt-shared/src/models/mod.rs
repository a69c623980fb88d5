/// Database models
///
/// Plain records mapped with `sqlx::FromRow`. Persistence lives behind the
/// [`Store`](crate::store::Store) trait so the same models work with both the
/// Postgres and SQLite backends.
///
/// # Models
///
/// - `user`: User accounts keyed by email
/// - `query_log`: Append-only log of analysis attempts
/// - `query_history`: Saved successful analyses, favorites and names
/// - `user_schema`: Saved schema used to generate SQL from questions
/// - `analytics`: Aggregate rows for dashboards

pub mod analytics;
pub mod query_history;
pub mod query_log;
pub mod user;
pub mod user_schema;
