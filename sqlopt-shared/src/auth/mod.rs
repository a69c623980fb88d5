/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: bcrypt password hashing and length validation
/// - [`jwt`]: Signed session tokens
/// - [`session`]: In-process session store (identity, quota, optimizer state)
/// - [`middleware`]: Bearer token + session authentication for Axum
/// - [`authorization`]: Admin rule and admin-only guards
///
/// # Flow
///
/// ```text
/// login: verify_password -> SessionStore::create -> create_token(email, sid)
/// request: bearer token -> validate_token -> SessionStore::touch -> AuthContext
/// logout: SessionStore::remove
/// ```
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::password::{hash_password, verify_password};
/// use sqlopt_shared::auth::jwt::{create_token, Claims};
/// use sqlopt_shared::auth::session::SessionStore;
/// use chrono::Utc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let sessions = SessionStore::new();
/// let session = sessions.create("ada@example.com", "Ada", false, Utc::now()).await;
/// let token = create_token(&Claims::new("ada@example.com", session.id), "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
