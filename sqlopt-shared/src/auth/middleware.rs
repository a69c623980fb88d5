/// Session authentication for Axum
///
/// This module turns an `Authorization: Bearer <token>` header into an
/// [`AuthContext`]. Authentication needs both:
///
/// 1. a token with a valid signature, issuer and expiry, and
/// 2. a live server-side session matching the token's `sid` claim.
///
/// Each successful authentication counts as a page load. It refreshes the
/// session's quota window.
///
/// # Request Extensions
///
/// After successful authentication the middleware adds an `AuthContext`
/// holding the session ID, email, name and effective admin flag.
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware, Extension};
/// use sqlopt_shared::auth::middleware::{session_auth_middleware, AuthContext};
/// use sqlopt_shared::auth::session::SessionStore;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.name)
/// }
///
/// let sessions = SessionStore::new();
/// let secret = "your-jwt-secret-at-least-32-bytes!!".to_string();
/// let app: Router = Router::new()
///     .route("/me", get(handler))
///     .layer(middleware::from_fn(move |req, next| {
///         session_auth_middleware(secret.clone(), sessions.clone(), req, next)
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use super::session::{Session, SessionStore};

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Server-side session ID
    pub session_id: Uuid,

    /// Authenticated user email
    pub email: String,

    /// Display name
    pub name: String,

    /// Effective admin flag
    pub is_admin: bool,
}

impl AuthContext {
    /// Creates auth context from a session snapshot
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id,
            email: session.email.clone(),
            name: session.name.clone(),
            is_admin: session.is_admin,
        }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token is valid but its session is gone (logout or restart)
    SessionNotFound,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::SessionNotFound => {
                (StatusCode::UNAUTHORIZED, "Session expired, please log in again").into_response()
            }
        }
    }
}

/// Extracts the bearer token from request headers
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` if there is no Authorization header
/// and `AuthError::InvalidFormat` if it is not a Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Authenticates request headers against the token secret and session store
///
/// Refreshes the session's quota window as a side effect.
///
/// # Errors
///
/// Returns `AuthError` if the header is missing or malformed, the token is
/// invalid or expired, or the session no longer exists
pub async fn authenticate(
    headers: &HeaderMap,
    secret: &str,
    sessions: &SessionStore,
    now: DateTime<Utc>,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    let session = sessions
        .touch(claims.sid, now)
        .await
        .ok_or(AuthError::SessionNotFound)?;

    // A token minted for one user must not unlock another user's session
    if session.email != claims.sub {
        return Err(AuthError::InvalidToken("Token does not match session".to_string()));
    }

    Ok(AuthContext::from_session(&session))
}

/// Session authentication middleware
///
/// Validates the bearer token, loads the session and inserts an
/// `AuthContext` into request extensions.
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - Authorization header is missing
/// - Token validation fails or the token has expired
/// - The session no longer exists
pub async fn session_auth_middleware(
    secret: String,
    sessions: SessionStore,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_context = authenticate(req.headers(), &secret, &sessions, Utc::now()).await?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
