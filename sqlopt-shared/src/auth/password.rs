/// Password hashing module using bcrypt
///
/// Passwords are stored as bcrypt hashes in modular crypt format
/// (`$2b$12$...`). Each call to [`hash_password`] draws a fresh random salt,
/// so hashing the same password twice yields different strings.
///
/// # Security
///
/// - **Algorithm**: bcrypt (`$2b$` variant)
/// - **Cost**: `bcrypt::DEFAULT_COST` (12)
/// - **Input limit**: bcrypt only reads the first 72 bytes; longer passwords
///   are rejected by [`validate_password`] rather than silently truncated
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password_123")?;
///
/// assert!(verify_password("super_secret_password_123", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// Minimum accepted password length in bytes
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Maximum accepted password length in bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with bcrypt at the default cost
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::password::hash_password;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("my_password")?;
/// assert!(hash.starts_with("$2b$"));
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash(password, DEFAULT_COST).map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored bcrypt hash
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash is malformed
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    verify(password, password_hash).map_err(|e| match e {
        BcryptError::InvalidHash(msg) => PasswordError::InvalidHash(msg),
        other => PasswordError::InvalidHash(other.to_string()),
    })
}

/// Validates password length before hashing
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::password::validate_password;
///
/// assert!(validate_password("long enough").is_ok());
/// assert!(validate_password("short").is_err());
/// assert!(validate_password(&"x".repeat(73)).is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_BYTES {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_BYTES
        ));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(format!(
            "Password must be at most {} bytes long",
            MAX_PASSWORD_BYTES
        ));
    }

    Ok(())
}
