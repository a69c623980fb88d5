/// Analysis dispatch
///
/// Ties the pieces of one "Analyze" action together:
///
/// ```text
/// run_analysis()
///   ├─> reject empty SQL (no quota, no API call)
///   ├─> consume one quota unit (non-admin sessions)
///   ├─> build prompt, call the completion client
///   ├─> success: log row + history row, remember the result in the session
///   └─> failure: log row with success=false, no history row
/// ```
///
/// The quota unit is spent before the external call and is not refunded when
/// the call fails.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session::{LastResult, SessionStore};
use crate::llm::{CompletionClient, CompletionRequest};
use crate::models::query_history::NewQueryHistory;
use crate::models::query_log::NewQueryLog;
use crate::prompt::{build_prompt, TaskType};
use crate::quota::{QuotaCheckResult, QuotaError};
use crate::store::Store;

/// Analysis error types
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// SQL was empty or whitespace
    #[error("Please enter a SQL query.")]
    EmptyQuery,

    /// Session vanished between authentication and dispatch
    #[error("Session not found")]
    SessionNotFound,

    /// Daily limit reached
    #[error("{0}")]
    QuotaExceeded(QuotaError),

    /// Completion call failed; the attempt has been logged
    #[error("Error: {0}")]
    CompletionFailed(String),
}

/// One analysis request
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub session_id: Uuid,
    pub task: TaskType,
    pub sql: String,
}

/// Successful analysis
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub task: TaskType,

    /// Model response, unmodified
    pub text: String,

    pub tokens_used: Option<i64>,

    /// History row, absent if the insert failed
    pub history_id: Option<i64>,

    /// Quota after this analysis; `None` for admins
    pub quota: Option<QuotaCheckResult>,
}

/// Runs one analysis for a session
///
/// # Errors
///
/// - `EmptyQuery` before anything else is touched
/// - `QuotaExceeded` when a non-admin session has used its daily analyses
/// - `CompletionFailed` when the completion call fails
pub async fn run_analysis(
    store: &dyn Store,
    llm: &dyn CompletionClient,
    sessions: &SessionStore,
    request: AnalysisRequest,
    now: DateTime<Utc>,
) -> Result<AnalysisOutcome, AnalysisError> {
    if request.sql.trim().is_empty() {
        return Err(AnalysisError::EmptyQuery);
    }

    let sql = request.sql.clone();
    let (email, quota) = sessions
        .update(request.session_id, |session| {
            session.current_sql = Some(sql);
            let quota = if session.is_admin {
                None
            } else {
                Some(session.quota.try_consume(now))
            };
            (session.email.clone(), quota)
        })
        .await
        .ok_or(AnalysisError::SessionNotFound)?;

    let quota = quota.transpose().map_err(AnalysisError::QuotaExceeded)?;
    let query_length = request.sql.chars().count() as i64;
    let prompt = build_prompt(request.task, &request.sql);

    info!(
        user = %email,
        task = %request.task,
        model = llm.model(),
        query_length,
        "Dispatching analysis"
    );

    let completion = match llm.complete(CompletionRequest::new(prompt)).await {
        Ok(completion) => completion,
        Err(e) => {
            let message = e.to_string();
            warn!(user = %email, task = %request.task, error = %message, "Analysis failed");

            let log = NewQueryLog::failure(&email, request.task, query_length, message.clone(), now);
            if let Err(log_err) = store.insert_query_log(log).await {
                warn!(error = %log_err, "Failed to record failed analysis");
            }

            return Err(AnalysisError::CompletionFailed(message));
        }
    };

    let log = NewQueryLog::success(&email, request.task, query_length, completion.tokens_used, now);
    if let Err(e) = store.insert_query_log(log).await {
        warn!(error = %e, "Failed to record analysis");
    }

    let history = NewQueryHistory {
        user_email: email.clone(),
        query_text: request.sql,
        task_type: request.task.as_str().to_string(),
        result_text: Some(completion.text.clone()),
        query_name: None,
        created_at: now,
    };
    let history_id = match store.insert_history(history).await {
        Ok(row) => Some(row.id),
        Err(e) => {
            warn!(error = %e, "Failed to save analysis to history");
            None
        }
    };

    let last = LastResult {
        task: request.task,
        text: completion.text.clone(),
        history_id,
    };
    sessions
        .update(request.session_id, |session| session.last_result = Some(last))
        .await;

    info!(
        user = %email,
        task = %request.task,
        tokens_used = ?completion.tokens_used,
        history_id = ?history_id,
        "Analysis completed"
    );

    Ok(AnalysisOutcome {
        task: request.task,
        text: completion.text,
        tokens_used: completion.tokens_used,
        history_id,
        quota,
    })
}
