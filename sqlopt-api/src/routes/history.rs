/// Query history endpoints
///
/// Every endpoint is scoped to the caller: IDs belonging to other users
/// behave exactly like IDs that don't exist (404).
///
/// # Endpoints
///
/// - `GET /v1/history?task=&search=` - Latest 50 rows, filtered
/// - `GET /v1/history/favorites` - Favorite rows
/// - `POST /v1/history/:id/favorite` - Toggle favorite
/// - `PUT /v1/history/:id/name` - Set or clear the name
/// - `DELETE /v1/history/:id` - Delete a row
/// - `POST /v1/history/:id/use` - Load the row's SQL into the optimizer

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sqlopt_shared::{
    auth::middleware::AuthContext,
    models::query_history::{HistoryFilter, HistoryPage, QueryHistory, DEFAULT_HISTORY_LIMIT},
};
use tracing::debug;
use validator::Validate;

/// Toggle response
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteResponse {
    pub id: i64,
    pub is_favorite: bool,
}

/// Rename request; an empty or missing name clears it
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    pub name: Option<String>,
}

/// Use response
#[derive(Debug, Serialize, Deserialize)]
pub struct UseResponse {
    pub id: i64,
    pub sql: String,
    pub task_type: String,
}

fn not_found() -> ApiError {
    ApiError::NotFound("History entry not found".to_string())
}

/// Lists recent history, optionally filtered by task and search text
pub async fn list_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<HistoryFilter>,
) -> ApiResult<Json<HistoryPage>> {
    let rows = state.store.list_history(&auth.email, DEFAULT_HISTORY_LIMIT).await?;
    let page = filter.apply(rows);

    debug!(user = %auth.email, shown = page.shown, total = page.total, "Listed history");
    Ok(Json(page))
}

/// Lists favorite rows
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<QueryHistory>>> {
    Ok(Json(state.store.list_favorites(&auth.email).await?))
}

/// Flips a row's favorite flag
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<FavoriteResponse>> {
    let is_favorite = state
        .store
        .toggle_favorite(id, &auth.email)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(FavoriteResponse { id, is_favorite }))
}

/// Sets or clears a row's name
pub async fn rename_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<QueryHistory>> {
    req.validate()?;
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    if state.store.rename_history(id, &auth.email, name).await? == 0 {
        return Err(not_found());
    }

    let row = state
        .store
        .find_history(id, &auth.email)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(row))
}

/// Deletes a row
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.store.delete_history(id, &auth.email).await? == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Loads a row's SQL as the session's current query
pub async fn use_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UseResponse>> {
    let row = state
        .store
        .find_history(id, &auth.email)
        .await?
        .ok_or_else(not_found)?;

    let sql = row.query_text.clone();
    state
        .sessions
        .update(auth.session_id, |session| session.current_sql = Some(sql))
        .await;

    Ok(Json(UseResponse {
        id: row.id,
        sql: row.query_text,
        task_type: row.task_type,
    }))
}
