/// Natural-language query endpoints
///
/// # Endpoints
///
/// - `GET /v1/nl/samples` - Built-in schemas
/// - `GET /v1/nl/schema` - The caller's stored schema with example questions
/// - `PUT /v1/nl/schema` - Store a pasted or built-in schema
/// - `DELETE /v1/nl/schema` - Forget the stored schema
/// - `POST /v1/nl/generate` - Turn a question into SQL (counts against the quota)
/// - `POST /v1/nl/use` - Load the last generated SQL into the optimizer
/// - `POST /v1/nl/save` - Save the last generated SQL to history
/// - `GET /v1/nl/download` - Last generated SQL as a `.sql` file

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::home::current_session,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlopt_shared::{
    auth::middleware::AuthContext,
    models::user_schema::UserSchema,
    nl::{
        example_questions, generate_sql, resolve_schema, GeneratedQuery, NlRequest, SchemaSource,
        DOWNLOAD_FILENAME, SAMPLE_SCHEMAS,
    },
    quota::QuotaCheckResult,
};
use tracing::info;

/// Built-in schema
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleSchema {
    pub name: String,
    pub schema: String,
}

/// Stored schema with suggestions
#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub schema: String,
    pub example_questions: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserSchema> for SchemaResponse {
    fn from(stored: UserSchema) -> Self {
        SchemaResponse {
            example_questions: example_questions(&stored.schema_text)
                .iter()
                .map(|q| q.to_string())
                .collect(),
            schema: stored.schema_text,
            updated_at: stored.updated_at,
        }
    }
}

/// Save-schema request; `sample` wins when both are given
#[derive(Debug, Deserialize)]
pub struct SaveSchemaRequest {
    /// Name from `GET /v1/nl/samples`
    pub sample: Option<String>,

    /// `CREATE TABLE` statements
    pub schema: Option<String>,
}

/// Generate request
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub question: String,

    #[serde(default = "default_include_explanation")]
    pub include_explanation: bool,
}

fn default_include_explanation() -> bool {
    true
}

/// Generate response
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub query: GeneratedQuery,

    pub tokens_used: Option<i64>,

    /// Remaining quota; absent for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaCheckResult>,
}

/// Generated SQL loaded into the optimizer
#[derive(Debug, Serialize, Deserialize)]
pub struct UseResponse {
    pub sql: String,
}

/// History row written by "save"
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub id: i64,
    pub query_name: Option<String>,
}

fn nothing_generated() -> ApiError {
    ApiError::NotFound("No generated SQL in this session".to_string())
}

async fn last_generated(state: &AppState, auth: &AuthContext) -> ApiResult<GeneratedQuery> {
    current_session(state, auth)
        .await?
        .last_generated
        .ok_or_else(nothing_generated)
}

/// Lists the built-in schemas
pub async fn list_samples() -> Json<Vec<SampleSchema>> {
    Json(
        SAMPLE_SCHEMAS
            .iter()
            .map(|(name, schema)| SampleSchema {
                name: name.to_string(),
                schema: schema.to_string(),
            })
            .collect(),
    )
}

/// Returns the caller's schema
///
/// # Errors
///
/// - `404 Not Found`: No schema stored
pub async fn get_schema(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SchemaResponse>> {
    let stored = state
        .store
        .find_user_schema(&auth.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No schema saved".to_string()))?;

    Ok(Json(stored.into()))
}

/// Stores the caller's schema, replacing any previous one
///
/// # Endpoint
///
/// ```text
/// PUT /v1/nl/schema
/// { "sample": "HR Database" }
/// { "schema": "CREATE TABLE users (id INT PRIMARY KEY, name TEXT);" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Empty or invalid schema, unknown sample
pub async fn save_schema(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SaveSchemaRequest>,
) -> ApiResult<Json<SchemaResponse>> {
    let source = match (req.sample, req.schema) {
        (Some(sample), _) => SchemaSource::Sample(sample),
        (None, schema) => SchemaSource::Text(schema.unwrap_or_default()),
    };
    let schema_text = resolve_schema(source)?;

    let stored = state.store.save_user_schema(&auth.email, &schema_text).await?;
    info!(user = %auth.email, schema_length = schema_text.len(), "Schema saved");

    Ok(Json(stored.into()))
}

/// Forgets the caller's schema
pub async fn delete_schema(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    if !state.store.delete_user_schema(&auth.email).await? {
        return Err(ApiError::NotFound("No schema saved".to_string()));
    }
    info!(user = %auth.email, "Schema cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// Turns a question into SQL
///
/// # Endpoint
///
/// ```text
/// POST /v1/nl/generate
/// { "question": "Who are the top 5 highest paid employees?", "include_explanation": true }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: No schema stored
/// - `422 Unprocessable Entity`: Empty question
/// - `429 Too Many Requests`: Daily quota reached
/// - `502 Bad Gateway`: Completion API failed
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let outcome = generate_sql(
        state.store.as_ref(),
        state.llm.as_ref(),
        &state.sessions,
        NlRequest {
            session_id: auth.session_id,
            question: req.question,
            include_explanation: req.include_explanation,
        },
        Utc::now(),
    )
    .await?;

    Ok(Json(GenerateResponse {
        query: outcome.query,
        tokens_used: outcome.tokens_used,
        quota: outcome.quota,
    }))
}

/// Loads the last generated SQL as the session's current query
pub async fn use_generated(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UseResponse>> {
    let generated = last_generated(&state, &auth).await?;

    let sql = generated.sql.clone();
    state
        .sessions
        .update(auth.session_id, |session| session.current_sql = Some(sql))
        .await;

    Ok(Json(UseResponse { sql: generated.sql }))
}

/// Saves the last generated SQL to history
pub async fn save_generated(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<(StatusCode, Json<SaveResponse>)> {
    let generated = last_generated(&state, &auth).await?;

    let row = state
        .store
        .insert_history(generated.history_entry(&auth.email, Utc::now()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            id: row.id,
            query_name: row.query_name,
        }),
    ))
}

/// Downloads the last generated SQL
///
/// Responds with `text/plain` and
/// `Content-Disposition: attachment; filename="generated_query.sql"`.
pub async fn download(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let generated = last_generated(&state, &auth).await?;
    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        generated.sql,
    )
        .into_response())
}
