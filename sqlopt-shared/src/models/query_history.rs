/// Query history model
///
/// One row per successful analysis. Owners can star rows as favorites,
/// give them a name, load them back into the optimizer, or delete them.
/// Every mutation is scoped by `user_email`: an ID belonging to another user
/// matches zero rows.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE query_history (
///     id BIGSERIAL PRIMARY KEY,
///     user_email TEXT NOT NULL,
///     query_text TEXT NOT NULL,
///     task_type TEXT NOT NULL,
///     result_text TEXT,
///     is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
///     query_name TEXT,
///     created_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of rows returned by the history page
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Saved analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueryHistory {
    /// Row ID
    pub id: i64,

    /// Owner
    pub user_email: String,

    /// SQL that was analyzed
    pub query_text: String,

    /// Task name
    pub task_type: String,

    /// Model response
    pub result_text: Option<String>,

    /// Starred by the owner
    pub is_favorite: bool,

    /// Optional owner-assigned name
    pub query_name: Option<String>,

    /// When the analysis ran
    pub created_at: DateTime<Utc>,
}

/// Input for a new history row
#[derive(Debug, Clone)]
pub struct NewQueryHistory {
    pub user_email: String,
    pub query_text: String,
    pub task_type: String,
    pub result_text: Option<String>,

    /// Name to save with the row; analyses leave it unset
    pub query_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Client-side filter for the history page
///
/// Applied to the most recent rows after they are loaded, so `total` in
/// [`HistoryPage`] counts the loaded rows, not the whole table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    /// Only rows for this task name
    pub task: Option<String>,

    /// Case-insensitive substring of the SQL or the name
    pub search: Option<String>,
}

impl HistoryFilter {
    /// Checks whether a row passes the filter
    pub fn matches(&self, entry: &QueryHistory) -> bool {
        if let Some(task) = self.task.as_deref().filter(|t| !t.is_empty()) {
            if entry.task_type != task {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                entry.query_text.to_lowercase().contains(&term)
                    || entry
                        .query_name
                        .as_deref()
                        .map(|name| name.to_lowercase().contains(&term))
                        .unwrap_or(false)
            }
            None => true,
        }
    }

    /// Filters loaded rows into a page
    pub fn apply(&self, entries: Vec<QueryHistory>) -> HistoryPage {
        let total = entries.len();
        let entries: Vec<QueryHistory> = entries.into_iter().filter(|e| self.matches(e)).collect();

        HistoryPage {
            shown: entries.len(),
            total,
            entries,
        }
    }
}

/// Filtered history rows with counts
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    /// Rows passing the filter
    pub shown: usize,

    /// Rows loaded before filtering
    pub total: usize,

    /// Filtered rows, newest first
    pub entries: Vec<QueryHistory>,
}
