/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; errors from the shared crate
/// convert with `?`.
///
/// # Status mapping
///
/// | Error | Status | Code |
/// |---|---|---|
/// | bad credentials, missing/expired session | 401 | `unauthorized` |
/// | non-admin on admin routes | 403 | `forbidden` |
/// | unknown or foreign row | 404 | `not_found` |
/// | duplicate email | 409 | `conflict` |
/// | no stored schema for a question | 400 | `bad_request` |
/// | invalid request body | 422 | `validation_error` |
/// | daily quota reached | 429 + `Retry-After` | `quota_exceeded` |
/// | completion API failure | 502 | `external_call_failed` |
///
/// # Example
///
/// ```
/// use sqlopt_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(id: i64) -> ApiResult<Json<serde_json::Value>> {
///     if id < 0 {
///         return Err(ApiError::NotFound("History entry not found".to_string()));
///     }
///     Ok(Json(json!({ "id": id })))
/// }
/// ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlopt_shared::analysis::AnalysisError;
use sqlopt_shared::auth::authorization::AuthzError;
use sqlopt_shared::auth::jwt::JwtError;
use sqlopt_shared::auth::middleware::AuthError;
use sqlopt_shared::auth::password::PasswordError;
use sqlopt_shared::nl::NlError;
use sqlopt_shared::quota::QuotaError;
use sqlopt_shared::store::StoreError;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    QuotaExceeded {
        retry_after: u64,
        message: String,
    },

    /// Completion API failed (502)
    ExternalCallFailed(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::QuotaExceeded { message, .. } => write!(f, "Quota exceeded: {}", message),
            ApiError::ExternalCallFailed(msg) => write!(f, "External call failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Quota errors carry a Retry-After header
        if let ApiError::QuotaExceeded { retry_after, message } = self {
            let body = Json(ErrorResponse {
                error: "quota_exceeded".to_string(),
                message,
                details: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            return response;
        }

        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::QuotaExceeded { message, .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "quota_exceeded", message, None)
            }
            ApiError::ExternalCallFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "external_call_failed", msg, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert store errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Missing credentials".to_string()),
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::SessionNotFound => {
                ApiError::Unauthorized("Session expired, please log in again".to_string())
            }
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::AdminRequired => ApiError::Forbidden(err.to_string()),
            AuthzError::SelfDeletion => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert token errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

/// Convert quota errors to API errors
impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        ApiError::QuotaExceeded {
            retry_after: err.retry_after(Utc::now()),
            message: err.to_string(),
        }
    }
}

/// Convert analysis errors to API errors
impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::EmptyQuery => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new("sql", err.to_string())])
            }
            AnalysisError::SessionNotFound => {
                ApiError::Unauthorized("Session expired, please log in again".to_string())
            }
            AnalysisError::QuotaExceeded(quota) => quota.into(),
            AnalysisError::CompletionFailed(_) => ApiError::ExternalCallFailed(err.to_string()),
        }
    }
}

/// Convert natural-language errors to API errors
impl From<NlError> for ApiError {
    fn from(err: NlError) -> Self {
        match err {
            NlError::EmptyQuestion => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new("question", err.to_string())])
            }
            NlError::EmptySchema | NlError::InvalidSchema => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new("schema", err.to_string())])
            }
            NlError::UnknownSample(_) => {
                ApiError::ValidationError(vec![ValidationErrorDetail::new("sample", err.to_string())])
            }
            NlError::SchemaMissing => ApiError::BadRequest(err.to_string()),
            NlError::SessionNotFound => {
                ApiError::Unauthorized("Session expired, please log in again".to_string())
            }
            NlError::QuotaExceeded(quota) => quota.into(),
            NlError::CompletionFailed(_) => ApiError::ExternalCallFailed(err.to_string()),
            NlError::Store(store) => store.into(),
        }
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    ValidationErrorDetail::new(
                        field.to_string(),
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", field)),
                    )
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_response_has_retry_after() {
        let response = ApiError::QuotaExceeded {
            retry_after: 3600,
            message: "Daily query limit reached. Limit resets in 24 hours.".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "3600");
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::ValidationError(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::ExternalCallFailed("x".into()), StatusCode::BAD_GATEWAY),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_store_error_mapping() {
        let conflict: ApiError = StoreError::Conflict("Email already exists".to_string()).into();
        assert!(matches!(conflict, ApiError::Conflict(ref m) if m == "Email already exists"));

        let unsupported: ApiError = StoreError::UnsupportedUrl("mysql://x".to_string()).into();
        assert!(matches!(unsupported, ApiError::InternalError(_)));
    }

    #[test]
    fn test_completion_failure_message() {
        let err: ApiError = AnalysisError::CompletionFailed("timeout".to_string()).into();
        match err {
            ApiError::ExternalCallFailed(msg) => assert_eq!(msg, "Error: timeout"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_nl_error_mapping() {
        let err: ApiError = NlError::CompletionFailed("timeout".to_string()).into();
        assert!(matches!(err, ApiError::ExternalCallFailed(ref m) if m == "Error generating SQL: timeout"));

        let err: ApiError = NlError::InvalidSchema.into();
        match err {
            ApiError::ValidationError(details) => assert_eq!(details[0].field, "schema"),
            other => panic!("unexpected {other:?}"),
        }

        let err: ApiError = NlError::SchemaMissing.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
