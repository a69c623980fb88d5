/// Session token generation and validation
///
/// A successful login returns a signed token that names the user and the
/// server-side session it belongs to. The token alone is not enough to
/// authenticate: the session it points at must still exist in the
/// [`SessionStore`](super::session::SessionStore), so logging out or
/// restarting the server invalidates every outstanding token.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable, 7 days by default
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session_id = Uuid::new_v4();
/// let claims = Claims::new("ada@example.com", session_id);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, "ada@example.com");
/// assert_eq!(validated.sid, session_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "sqlopt";

/// Default token lifetime
pub const DEFAULT_TTL_HOURS: i64 = 24 * 7;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user email
    pub sub: String,

    /// Server-side session ID
    pub sid: Uuid,

    /// Issuer - always "sqlopt"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims with the default lifetime
    pub fn new(email: impl Into<String>, session_id: Uuid) -> Self {
        Self::with_expiration(email, session_id, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Creates claims with a custom lifetime
    ///
    /// # Example
    ///
    /// ```
    /// use sqlopt_shared::auth::jwt::Claims;
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration("ada@example.com", Uuid::new_v4(), Duration::hours(1));
    /// assert!(!claims.is_expired());
    /// ```
    pub fn with_expiration(email: impl Into<String>, session_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: email.into(),
            sid: session_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a token string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Verifies signature, expiration, not-before and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired`, `JwtError::InvalidIssuer`, or
/// `JwtError::ValidationError` for any other failure
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let sid = Uuid::new_v4();
        let claims = Claims::new("ada@example.com", sid);

        assert_eq!(claims.sub, "ada@example.com");
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TTL_HOURS * 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let sid = Uuid::new_v4();
        let token = create_token(&Claims::new("ada@example.com", sid), SECRET).unwrap();

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, "ada@example.com");
        assert_eq!(validated.sid, sid);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new("ada@example.com", Uuid::new_v4()), SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, "another-secret-key-at-least-32-bytes"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            "ada@example.com",
            Uuid::new_v4(),
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new("ada@example.com", Uuid::new_v4());
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_validate_garbage() {
        assert!(validate_token("not.a.token", SECRET).is_err());
    }
}
