/// Admin user management endpoints
///
/// # Endpoints
///
/// - `GET /v1/users` - All users
/// - `GET /v1/users/regular` - Users without the stored admin flag
/// - `GET /v1/users/stats` - Per-user usage
/// - `POST /v1/users/:email/admin` - Set or clear the stored admin flag
/// - `PUT /v1/users/:email/password` - Reset a password
/// - `DELETE /v1/users/:email` - Delete an account
///
/// Changes take effect on the target's live sessions immediately.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::auth::normalize_email,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sqlopt_shared::{
    analytics::{self, UserStats},
    auth::{
        authorization::{effective_admin, require_not_self},
        middleware::AuthContext,
        password,
    },
    models::user::UserSummary,
};
use tracing::{info, warn};

/// Admin flag request; an empty body grants admin
#[derive(Debug, Deserialize)]
pub struct AdminFlagRequest {
    #[serde(default = "default_is_admin")]
    pub is_admin: bool,
}

fn default_is_admin() -> bool {
    true
}

/// Admin flag response
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminFlagResponse {
    pub email: String,

    /// Stored flag after the change
    pub is_admin: bool,

    /// Stored flag OR allowlist
    pub effective_admin: bool,
}

/// Password reset request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// Lists all users, ordered by email
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.store.list_users().await?))
}

/// Lists users that can be promoted
pub async fn list_regular_users(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.store.list_regular_users().await?))
}

/// Per-user totals and task breakdown
pub async fn user_stats(State(state): State<AppState>) -> ApiResult<Json<Vec<UserStats>>> {
    Ok(Json(analytics::user_stats(state.store.as_ref()).await?))
}

/// Sets the stored admin flag
///
/// Allowlisted users stay admins even when the flag is cleared.
pub async fn grant_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(email): Path<String>,
    body: Option<Json<AdminFlagRequest>>,
) -> ApiResult<Json<AdminFlagResponse>> {
    let email = normalize_email(&email);
    let is_admin = body.map(|Json(b)| b.is_admin).unwrap_or(true);

    if !state.store.set_admin(&email, is_admin).await? {
        return Err(user_not_found());
    }

    let effective = effective_admin(is_admin, &email, &state.allowlist);
    let touched = state
        .sessions
        .update_for_email(&email, |session| session.is_admin = effective)
        .await;

    info!(
        admin = %auth.email,
        target = %email,
        is_admin,
        effective,
        sessions = touched,
        "Admin flag changed"
    );

    Ok(Json(AdminFlagResponse {
        email,
        is_admin,
        effective_admin: effective,
    }))
}

/// Replaces a user's password
///
/// Existing sessions stay valid.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(email): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    let email = normalize_email(&email);

    password::validate_password(&req.password)
        .map_err(|e| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)]))?;
    let password_hash = password::hash_password(&req.password)?;

    if !state.store.update_password(&email, &password_hash).await? {
        return Err(user_not_found());
    }

    info!(admin = %auth.email, target = %email, "Password reset");
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes an account and ends its sessions
///
/// Logs and history rows are kept.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(email): Path<String>,
) -> ApiResult<StatusCode> {
    let email = normalize_email(&email);
    require_not_self(&auth, &email)?;

    if !state.store.delete_user(&email).await? {
        warn!(admin = %auth.email, target = %email, "Delete requested for unknown user");
        return Err(user_not_found());
    }

    let ended = state.sessions.remove_for_email(&email).await;
    info!(admin = %auth.email, target = %email, sessions = ended, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
