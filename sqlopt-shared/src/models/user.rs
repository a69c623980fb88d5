/// User model
///
/// Users are keyed by email. Passwords are stored as bcrypt hashes, never in
/// plaintext.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     email TEXT PRIMARY KEY,
///     name TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use sqlopt_shared::models::user::CreateUser;
/// use sqlopt_shared::store::Store;
///
/// # async fn example(store: &dyn Store) -> Result<(), Box<dyn std::error::Error>> {
/// let user = store
///     .create_user(CreateUser {
///         email: "ada@example.com".to_string(),
///         name: "Ada".to_string(),
///         password_hash: "$2b$12$...".to_string(),
///         is_admin: false,
///     })
///     .await?;
///
/// let found = store.find_user("ada@example.com").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Email address (primary key)
    pub email: String,

    /// Display name
    pub name: String,

    /// bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Stored admin flag
    ///
    /// The effective admin status also considers the `ADMIN_EMAILS` allowlist,
    /// see [`crate::auth::authorization::effective_admin`].
    pub is_admin: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// bcrypt hash (NOT plaintext password!)
    pub password_hash: String,

    /// Stored admin flag
    pub is_admin: bool,
}

/// User as listed on the admin users page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    /// Email address
    pub email: String,

    /// Display name
    pub name: String,

    /// Stored admin flag
    pub is_admin: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        UserSummary {
            email: user.email,
            name: user.name,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_summary_from_user() {
        let created_at = Utc::now();
        let user = User {
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            password_hash: "hash".to_string(),
            is_admin: true,
            created_at,
        };

        let summary = UserSummary::from(user);
        assert_eq!(summary.email, "ada@example.com");
        assert!(summary.is_admin);
        assert_eq!(summary.created_at, created_at);
    }
}
