/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create an account
/// - `POST /v1/auth/login` - Start a session and get a session token
/// - `POST /v1/auth/logout` - End the current session
///
/// Emails are trimmed and lowercased before lookup, so `Ada@Example.com` and
/// `ada@example.com` are the same account.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlopt_shared::{
    auth::{
        authorization::effective_admin,
        jwt::{self, Claims},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, UserSummary},
};
use tracing::info;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Password, 8 to 72 bytes
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
    pub message: String,
}

/// Login request
///
/// The email is not format-checked; an address that can't exist simply
/// isn't found.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Public view of the signed-in user
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session token for the `Authorization: Bearer` header
    pub token: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,

    pub user: SessionUser,
}

/// Canonical form of an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "name": "Ada",
///   "password": "correct horse"
/// }
/// ```
///
/// The stored admin flag is set when the email is in `ADMIN_EMAILS`.
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.email = normalize_email(&req.email);
    req.name = req.name.trim().to_string();
    req.validate()?;

    password::validate_password(&req.password)
        .map_err(|e| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e)]))?;

    let password_hash = password::hash_password(&req.password)?;
    let is_admin = state.allowlist.contains(&req.email);

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            name: req.name,
            password_hash,
            is_admin,
        })
        .await?;

    info!(email = %user.email, is_admin = user.is_admin, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            message: "Registration successful! Please log in.".to_string(),
        }),
    ))
}

/// Login endpoint
///
/// Creates a server-side session and returns a signed token naming it.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "correct horse"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: "User not found" or "Invalid password"
pub async fn login(
    State(state): State<AppState>,
    Json(mut req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.email = normalize_email(&req.email);

    let user = state
        .store
        .find_user(&req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let is_admin = effective_admin(user.is_admin, &user.email, &state.allowlist);
    let session = state
        .sessions
        .create(user.email.clone(), user.name.clone(), is_admin, Utc::now())
        .await;

    let claims = Claims::with_expiration(user.email.clone(), session.id, state.sessions.ttl());
    let token = jwt::create_token(&claims, state.jwt_secret())?;
    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .ok_or_else(|| ApiError::InternalError("Token expiry out of range".to_string()))?;

    info!(email = %user.email, is_admin, session_id = %session.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: SessionUser {
            email: user.email,
            name: user.name,
            is_admin,
        },
    }))
}

/// Logout endpoint
///
/// Removes the server-side session; its token is rejected afterwards.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/logout
/// Authorization: Bearer <token>
/// ```
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> StatusCode {
    state.sessions.remove(auth.session_id).await;
    info!(email = %auth.email, session_id = %auth.session_id, "User logged out");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password: "correct horse".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            name: String::new(),
            password: "correct horse".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("name"));
    }
}
