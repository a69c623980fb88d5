/// Admin analytics endpoints
///
/// # Endpoints
///
/// - `GET /v1/analytics?refresh=true` - Summary, cached per session for 30 s
/// - `GET /v1/analytics/activity` - Attempts in the last 2 hours
/// - `GET /v1/analytics/top-users` - Users with the most attempts
/// - `GET /v1/analytics/errors` - Most recent failures

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlopt_shared::{
    analytics::{
        summary_for_session, SummaryView, RECENT_ACTIVITY_HOURS, RECENT_ACTIVITY_LIMIT,
        RECENT_ERRORS_LIMIT, TOP_USERS_LIMIT,
    },
    auth::middleware::AuthContext,
    models::{analytics::UserActivity, query_log::QueryLog},
};

/// Summary query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// Bypass the session cache
    #[serde(default)]
    pub refresh: bool,
}

/// Dashboard summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<SummaryParams>,
) -> ApiResult<Json<SummaryView>> {
    let view = summary_for_session(
        state.store.as_ref(),
        &state.sessions,
        auth.session_id,
        params.refresh,
        Utc::now(),
    )
    .await?;

    Ok(Json(view))
}

/// Recent attempts across all users
pub async fn recent_activity(State(state): State<AppState>) -> ApiResult<Json<Vec<QueryLog>>> {
    let since = Utc::now() - Duration::hours(RECENT_ACTIVITY_HOURS);
    Ok(Json(state.store.recent_activity(since, RECENT_ACTIVITY_LIMIT).await?))
}

/// Busiest users
pub async fn top_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserActivity>>> {
    Ok(Json(state.store.top_users(TOP_USERS_LIMIT).await?))
}

/// Latest failures
pub async fn recent_errors(State(state): State<AppState>) -> ApiResult<Json<Vec<QueryLog>>> {
    Ok(Json(state.store.recent_errors(RECENT_ERRORS_LIMIT).await?))
}
