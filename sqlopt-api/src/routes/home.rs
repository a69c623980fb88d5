/// Home dashboard and quota status
///
/// # Endpoints
///
/// - `GET /v1/me` - Caller profile, usage totals and recent activity
/// - `GET /v1/quota` - Daily analysis quota

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlopt_shared::{
    analytics::success_rate,
    auth::{middleware::AuthContext, session::Session},
    models::query_log::QueryLog,
};

/// Recent log rows shown on the dashboard
pub const RECENT_ACTIVITY_LIMIT: i64 = 5;

/// Quota status for the current session
#[derive(Debug, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Admin sessions have no limit
    pub unlimited: bool,

    /// Whether the Analyze action is currently allowed
    pub can_analyze: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl QuotaStatus {
    /// Reads the quota of a session snapshot
    pub fn for_session(session: &Session, now: DateTime<Utc>) -> Self {
        if session.is_admin {
            return QuotaStatus {
                unlimited: true,
                can_analyze: true,
                used: None,
                limit: None,
                remaining: None,
                reset_at: None,
            };
        }

        let check = session.quota.check(now);
        QuotaStatus {
            unlimited: false,
            can_analyze: check.allowed,
            used: Some(check.current),
            limit: Some(check.limit),
            remaining: Some(check.remaining),
            reset_at: Some(check.reset_at),
        }
    }
}

/// Home dashboard
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub email: String,
    pub name: String,

    /// "Admin" or "User"
    pub role: String,

    pub total_queries: i64,

    /// Percent, 0..=100
    pub success_rate: f64,

    /// Most recent attempts, newest first
    pub recent_activity: Vec<QueryLog>,

    pub quota: QuotaStatus,
}

/// Loads the session behind an auth context
pub(crate) async fn current_session(state: &AppState, auth: &AuthContext) -> ApiResult<Session> {
    state
        .sessions
        .get(auth.session_id)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Session expired, please log in again".to_string()))
}

/// Home dashboard handler
///
/// # Endpoint
///
/// ```text
/// GET /v1/me
/// Authorization: Bearer <token>
/// ```
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    let session = current_session(&state, &auth).await?;
    let totals = state.store.log_totals_for_user(&auth.email).await?;
    let recent_activity = state
        .store
        .recent_logs_for_user(&auth.email, RECENT_ACTIVITY_LIMIT)
        .await?;

    Ok(Json(DashboardResponse {
        email: auth.email,
        name: auth.name,
        role: if auth.is_admin { "Admin" } else { "User" }.to_string(),
        total_queries: totals.total_queries,
        success_rate: success_rate(totals.successful_queries, totals.total_queries),
        recent_activity,
        quota: QuotaStatus::for_session(&session, Utc::now()),
    }))
}

/// Quota status handler
///
/// # Endpoint
///
/// ```text
/// GET /v1/quota
/// Authorization: Bearer <token>
/// ```
pub async fn quota(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<QuotaStatus>> {
    let session = current_session(&state, &auth).await?;
    Ok(Json(QuotaStatus::for_session(&session, Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_quota_is_unlimited() {
        let session = Session::new("admin@example.com", "Admin", true, Utc::now());
        let status = QuotaStatus::for_session(&session, Utc::now());
        assert!(status.unlimited);
        assert!(status.can_analyze);
        assert!(status.remaining.is_none());
    }

    #[test]
    fn test_exhausted_quota_disables_analyze() {
        let now = Utc::now();
        let mut session = Session::new("ada@example.com", "Ada", false, now);
        for _ in 0..5 {
            session.quota.try_consume(now).unwrap();
        }

        let status = QuotaStatus::for_session(&session, now);
        assert!(!status.unlimited);
        assert!(!status.can_analyze);
        assert_eq!(status.used, Some(5));
        assert_eq!(status.remaining, Some(0));
    }
}
