/// Aggregate rows read from `query_logs` and `users`
///
/// These are raw counts as returned by the store. Derived figures such as
/// success rate, average length and cost are computed in
/// [`crate::analytics`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whole-table totals over `query_logs`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    /// Logged attempts
    pub total_queries: i64,

    /// Successful attempts
    pub successful_queries: i64,

    /// Sum of `query_length`
    pub total_query_length: i64,

    /// Sum of `tokens_used`
    pub total_tokens: i64,

    /// Registered users
    pub total_users: i64,

    /// Distinct users with a log row in the activity window
    pub active_users: i64,
}

/// Attempt count for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskCount {
    /// Task name
    pub task_type: String,

    /// Logged attempts
    pub count: i64,
}

/// Attempt count for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserActivity {
    pub user_email: String,

    /// Display name, or the email for users that no longer exist
    pub name: String,

    pub query_count: i64,
}

/// Per-user totals for the admin users page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserTotals {
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub total_queries: i64,
    pub successful_queries: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Attempt count for one (user, task) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserTaskCount {
    pub user_email: String,
    pub task_type: String,
    pub count: i64,
}

/// Totals for a single user's own dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTotals {
    pub total_queries: i64,
    pub successful_queries: i64,
}
