/// Saved database schema for SQL generation
///
/// Each user keeps at most one schema: the `CREATE TABLE` statements the
/// model reads when turning a question into SQL. Saving again replaces it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_schemas (
///     user_email TEXT PRIMARY KEY,
///     schema_text TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's saved schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSchema {
    /// Owner
    pub user_email: String,

    /// `CREATE TABLE` statements as entered
    pub schema_text: String,

    pub created_at: DateTime<Utc>,

    /// Last replacement
    pub updated_at: DateTime<Utc>,
}
