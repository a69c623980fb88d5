/// Optimizer endpoints
///
/// # Endpoints
///
/// - `GET /v1/optimizer/tasks` - Task types with descriptions
/// - `POST /v1/optimizer/format` - Format SQL and load it as the current query
/// - `GET /v1/optimizer/current` - SQL currently loaded in the session
/// - `POST /v1/optimizer/analyze` - Run an analysis (counts against the quota)
/// - `GET /v1/optimizer/download` - Last result as a text file

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::home::current_session,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlopt_shared::{
    analysis::{run_analysis, AnalysisRequest},
    auth::middleware::AuthContext,
    formatter::format_sql,
    prompt::TaskType,
    quota::QuotaCheckResult,
};

/// Task type with its description
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: TaskType,
    pub description: String,
}

/// SQL payload
#[derive(Debug, Serialize, Deserialize)]
pub struct SqlBody {
    pub sql: String,
}

/// Current query response
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentQuery {
    pub sql: Option<String>,
}

/// Analyze request
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// "Explain", "Optimize", "Detect Issues" or "Test"
    pub task: TaskType,
    pub sql: String,
}

/// Analyze response
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub task: TaskType,

    /// Model response (Markdown), unmodified
    pub result: String,

    pub tokens_used: Option<i64>,

    /// Saved history row, absent if saving failed
    pub history_id: Option<i64>,

    /// Remaining quota; absent for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaCheckResult>,
}

/// Lists task types in display order
pub async fn list_tasks() -> Json<Vec<TaskInfo>> {
    Json(
        TaskType::ALL
            .iter()
            .map(|task| TaskInfo {
                name: *task,
                description: task.description().to_string(),
            })
            .collect(),
    )
}

/// Formats SQL and stores the result as the session's current query
///
/// # Endpoint
///
/// ```text
/// POST /v1/optimizer/format
/// { "sql": "select id from t where x=1" }
/// ```
pub async fn format(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<SqlBody>,
) -> ApiResult<Json<SqlBody>> {
    let formatted = format_sql(&body.sql);

    let sql = formatted.clone();
    state
        .sessions
        .update(auth.session_id, |session| session.current_sql = Some(sql))
        .await;

    Ok(Json(SqlBody { sql: formatted }))
}

/// Returns the SQL currently loaded in the session
pub async fn current_query(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CurrentQuery>> {
    let session = current_session(&state, &auth).await?;
    Ok(Json(CurrentQuery {
        sql: session.current_sql,
    }))
}

/// Runs one analysis
///
/// # Endpoint
///
/// ```text
/// POST /v1/optimizer/analyze
/// { "task": "Detect Issues", "sql": "SELECT * FROM orders" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Empty SQL or unknown task
/// - `429 Too Many Requests`: Daily quota reached
/// - `502 Bad Gateway`: Completion API failed
pub async fn analyze(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let outcome = run_analysis(
        state.store.as_ref(),
        state.llm.as_ref(),
        &state.sessions,
        AnalysisRequest {
            session_id: auth.session_id,
            task: req.task,
            sql: req.sql,
        },
        Utc::now(),
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        task: outcome.task,
        result: outcome.text,
        tokens_used: outcome.tokens_used,
        history_id: outcome.history_id,
        quota: outcome.quota,
    }))
}

/// Downloads the last analysis result
///
/// Responds with `text/plain` and
/// `Content-Disposition: attachment; filename="sql_analysis_<task>.txt"`.
///
/// # Errors
///
/// - `404 Not Found`: No analysis has run in this session
pub async fn download(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let session = current_session(&state, &auth).await?;
    let last = session
        .last_result
        .ok_or_else(|| ApiError::NotFound("No analysis result to download".to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", last.task.download_filename());

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        last.text,
    )
        .into_response())
}
