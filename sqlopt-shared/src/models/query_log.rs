/// Query log model
///
/// One append-only row per analysis attempt, successful or not. Logs feed the
/// home dashboard and the admin analytics; they are never updated.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE query_logs (
///     id BIGSERIAL PRIMARY KEY,
///     user_email TEXT NOT NULL,
///     task_type TEXT NOT NULL,
///     query_length BIGINT NOT NULL,
///     tokens_used BIGINT,
///     success BOOLEAN NOT NULL,
///     error_message TEXT,
///     created_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompt::TaskType;

/// Logged analysis attempt
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueryLog {
    /// Row ID
    pub id: i64,

    /// User who ran the analysis
    pub user_email: String,

    /// Task name, e.g. "Detect Issues"
    pub task_type: String,

    /// Length of the submitted SQL in characters
    pub query_length: i64,

    /// Tokens reported by the completion API
    pub tokens_used: Option<i64>,

    /// Whether the completion call succeeded
    pub success: bool,

    /// Error text for failed attempts
    pub error_message: Option<String>,

    /// When the attempt was made
    pub created_at: DateTime<Utc>,
}

/// Input for a new log row
#[derive(Debug, Clone)]
pub struct NewQueryLog {
    pub user_email: String,
    pub task_type: String,
    pub query_length: i64,
    pub tokens_used: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewQueryLog {
    /// Log row for a successful call
    pub fn success(
        user_email: &str,
        task: TaskType,
        query_length: i64,
        tokens_used: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        NewQueryLog {
            user_email: user_email.to_string(),
            task_type: task.as_str().to_string(),
            query_length,
            tokens_used,
            success: true,
            error_message: None,
            created_at,
        }
    }

    /// Log row for a failed call
    pub fn failure(
        user_email: &str,
        task: TaskType,
        query_length: i64,
        error_message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        NewQueryLog {
            user_email: user_email.to_string(),
            task_type: task.as_str().to_string(),
            query_length,
            tokens_used: None,
            success: false,
            error_message: Some(error_message.into()),
            created_at,
        }
    }
}
