/// Admin analytics
///
/// Turns raw store aggregates into dashboard figures and caches the summary
/// per session for [`CACHE_TTL_SECONDS`].
///
/// # Derived figures
///
/// - success rate: `successful / total * 100`, 0 when there are no queries
/// - average query length: `total_query_length / total`, 0 when empty
/// - estimated cost: `total_tokens / 1000 * COST_PER_1K_TOKENS` USD
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use sqlopt_shared::analytics::summary_for_session;
/// use sqlopt_shared::auth::session::SessionStore;
/// use sqlopt_shared::store::sqlite::SqliteStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::in_memory().await?;
/// let sessions = SessionStore::new();
/// let session = sessions.create("admin@example.com", "Admin", true, Utc::now()).await;
///
/// let view = summary_for_session(&store, &sessions, session.id, false, Utc::now()).await?;
/// println!("{} queries, fresh: {}", view.summary.total_queries, view.is_fresh);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::auth::session::SessionStore;
use crate::models::analytics::{TaskCount, UsageTotals, UserTaskCount, UserTotals};
use crate::store::{Store, StoreResult};

/// How long a cached summary is served
pub const CACHE_TTL_SECONDS: i64 = 30;

/// Estimated USD cost per 1000 tokens
pub const COST_PER_1K_TOKENS: f64 = 0.000150;

/// Window for counting active users
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

/// Window and row cap for the recent activity feed
pub const RECENT_ACTIVITY_HOURS: i64 = 2;
pub const RECENT_ACTIVITY_LIMIT: i64 = 8;

pub const TOP_USERS_LIMIT: i64 = 10;
pub const RECENT_ERRORS_LIMIT: i64 = 10;

/// Percentage of successful queries, 0 when `total` is 0
pub fn success_rate(successful: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    }
}

/// Estimated API cost in USD
pub fn estimated_cost(total_tokens: i64) -> f64 {
    total_tokens as f64 / 1000.0 * COST_PER_1K_TOKENS
}

/// Dashboard summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_queries: i64,
    pub successful_queries: i64,

    /// Percent, 0..=100
    pub success_rate: f64,

    /// Most used first
    pub queries_by_task: Vec<TaskCount>,

    pub total_users: i64,

    /// Distinct users with a query in the last 7 days
    pub active_users_7d: i64,

    /// Mean SQL length in characters
    pub avg_query_length: f64,

    pub total_tokens: i64,

    /// USD
    pub estimated_cost: f64,

    pub most_popular_task: Option<String>,
}

impl AnalyticsSummary {
    /// Derives the summary from raw aggregates
    ///
    /// `queries_by_task` is re-sorted by count descending (ties by name) so the
    /// first entry is the most popular task.
    pub fn from_parts(totals: UsageTotals, mut queries_by_task: Vec<TaskCount>) -> Self {
        queries_by_task.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.task_type.cmp(&b.task_type)));

        let avg_query_length = if totals.total_queries > 0 {
            totals.total_query_length as f64 / totals.total_queries as f64
        } else {
            0.0
        };

        AnalyticsSummary {
            total_queries: totals.total_queries,
            successful_queries: totals.successful_queries,
            success_rate: success_rate(totals.successful_queries, totals.total_queries),
            most_popular_task: queries_by_task.first().map(|t| t.task_type.clone()),
            queries_by_task,
            total_users: totals.total_users,
            active_users_7d: totals.active_users,
            avg_query_length,
            total_tokens: totals.total_tokens,
            estimated_cost: estimated_cost(totals.total_tokens),
        }
    }
}

/// Reads aggregates and builds a fresh summary
pub async fn compute_summary(store: &dyn Store, now: DateTime<Utc>) -> StoreResult<AnalyticsSummary> {
    let totals = store.usage_totals(now - Duration::days(ACTIVE_WINDOW_DAYS)).await?;
    let by_task = store.queries_by_task().await?;
    Ok(AnalyticsSummary::from_parts(totals, by_task))
}

/// Summary kept in a session
#[derive(Debug, Clone)]
pub struct CachedSummary {
    pub summary: AnalyticsSummary,
    pub computed_at: DateTime<Utc>,
}

impl CachedSummary {
    pub fn new(summary: AnalyticsSummary, computed_at: DateTime<Utc>) -> Self {
        Self { summary, computed_at }
    }

    /// Seconds since computation, never negative
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.computed_at).num_seconds().max(0)
    }

    /// Whether the entry may still be served
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age_seconds(now) < CACHE_TTL_SECONDS
    }
}

/// Summary plus cache metadata
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub summary: AnalyticsSummary,
    pub computed_at: DateTime<Utc>,

    /// Seconds since `computed_at`
    pub age_seconds: i64,

    /// True when computed for this request
    pub is_fresh: bool,
}

/// Serves the session's cached summary or recomputes it
///
/// A new summary is computed when `refresh` is set, when the session holds
/// none, or when the cached one is older than [`CACHE_TTL_SECONDS`].
pub async fn summary_for_session(
    store: &dyn Store,
    sessions: &SessionStore,
    session_id: Uuid,
    refresh: bool,
    now: DateTime<Utc>,
) -> StoreResult<SummaryView> {
    if !refresh {
        let cached = sessions
            .get(session_id)
            .await
            .and_then(|session| session.analytics_cache)
            .filter(|cache| cache.is_fresh(now));

        if let Some(cache) = cached {
            debug!(age_seconds = cache.age_seconds(now), "Serving cached analytics summary");
            return Ok(SummaryView {
                age_seconds: cache.age_seconds(now),
                computed_at: cache.computed_at,
                summary: cache.summary,
                is_fresh: false,
            });
        }
    }

    let summary = compute_summary(store, now).await?;
    let cache = CachedSummary::new(summary.clone(), now);
    sessions
        .update(session_id, |session| session.analytics_cache = Some(cache))
        .await;

    debug!(refresh, "Computed analytics summary");
    Ok(SummaryView {
        summary,
        computed_at: now,
        age_seconds: 0,
        is_fresh: true,
    })
}

/// Per-user statistics for the admin users page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub total_queries: i64,
    pub successful_queries: i64,
    pub success_rate: f64,
    pub last_activity: Option<DateTime<Utc>>,

    /// Most used first
    pub by_task: Vec<TaskCount>,
}

/// Joins per-user totals with their per-task breakdown, busiest users first
pub fn build_user_stats(totals: Vec<UserTotals>, task_counts: Vec<UserTaskCount>) -> Vec<UserStats> {
    let mut by_user: HashMap<String, Vec<TaskCount>> = HashMap::new();
    for row in task_counts {
        by_user.entry(row.user_email).or_default().push(TaskCount {
            task_type: row.task_type,
            count: row.count,
        });
    }

    let mut stats: Vec<UserStats> = totals
        .into_iter()
        .map(|user| {
            let mut by_task = by_user.remove(&user.email).unwrap_or_default();
            by_task.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.task_type.cmp(&b.task_type)));

            UserStats {
                success_rate: success_rate(user.successful_queries, user.total_queries),
                email: user.email,
                name: user.name,
                is_admin: user.is_admin,
                total_queries: user.total_queries,
                successful_queries: user.successful_queries,
                last_activity: user.last_activity,
                by_task,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.total_queries.cmp(&a.total_queries).then_with(|| a.email.cmp(&b.email)));
    stats
}

/// Loads and joins per-user statistics
pub async fn user_stats(store: &dyn Store) -> StoreResult<Vec<UserStats>> {
    let totals = store.user_totals().await?;
    let task_counts = store.user_task_counts().await?;
    Ok(build_user_stats(totals, task_counts))
}
