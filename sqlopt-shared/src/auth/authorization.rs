/// Authorization helpers and the admin rule
///
/// There are two roles. Regular users analyze SQL and manage their own
/// history. Admins are additionally unlimited by the daily quota and may use
/// the analytics and user-management endpoints.
///
/// # Admin Rule
///
/// A user is an admin when **either** holds:
///
/// - the stored `users.is_admin` flag is set, or
/// - the email is on the `ADMIN_EMAILS` allowlist
///
/// Registration stores `is_admin = email ∈ allowlist`, so an allowlisted
/// account keeps its flag even if the allowlist later changes.
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::authorization::{effective_admin, AdminAllowlist};
///
/// let allowlist = AdminAllowlist::from_csv("root@example.com, ops@example.com");
/// assert!(effective_admin(false, "ops@example.com", &allowlist));
/// assert!(effective_admin(true, "ada@example.com", &allowlist));
/// assert!(!effective_admin(false, "ada@example.com", &allowlist));
/// ```

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is not an admin
    #[error("Admin access required")]
    AdminRequired,

    /// Admin tried to remove their own account
    #[error("You cannot delete your own account")]
    SelfDeletion,
}

/// Emails that are always treated as admins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowlist {
    emails: Vec<String>,
}

impl AdminAllowlist {
    /// Creates an allowlist from individual emails
    ///
    /// Emails are trimmed and compared case-insensitively.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list, as found in `ADMIN_EMAILS`
    pub fn from_csv(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    /// Checks allowlist membership
    pub fn contains(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.emails.iter().any(|e| *e == email)
    }

    /// Allowlisted emails
    pub fn emails(&self) -> &[String] {
        &self.emails
    }
}

/// Applies the admin rule: stored flag OR allowlist membership
pub fn effective_admin(stored_flag: bool, email: &str, allowlist: &AdminAllowlist) -> bool {
    stored_flag || allowlist.contains(email)
}

/// Checks that the caller is an admin
///
/// # Errors
///
/// Returns `AuthzError::AdminRequired` for non-admin sessions
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin {
        Ok(())
    } else {
        Err(AuthzError::AdminRequired)
    }
}

/// Checks that an admin action does not target the caller's own account
///
/// # Errors
///
/// Returns `AuthzError::SelfDeletion` when `target_email` is the caller
pub fn require_not_self(auth: &AuthContext, target_email: &str) -> Result<(), AuthzError> {
    if auth.email.eq_ignore_ascii_case(target_email.trim()) {
        Err(AuthzError::SelfDeletion)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn context(email: &str, is_admin: bool) -> AuthContext {
        AuthContext {
            session_id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test".to_string(),
            is_admin,
        }
    }

    #[test]
    fn test_allowlist_parsing() {
        let allowlist = AdminAllowlist::from_csv(" Root@Example.com ,, ops@example.com,");
        assert_eq!(allowlist.emails(), &["root@example.com", "ops@example.com"]);
        assert!(allowlist.contains("root@example.com"));
        assert!(allowlist.contains("ROOT@example.COM"));
        assert!(!allowlist.contains("someone@example.com"));
    }

    #[test]
    fn test_empty_allowlist() {
        let allowlist = AdminAllowlist::from_csv("");
        assert!(allowlist.emails().is_empty());
        assert!(!allowlist.contains(""));
    }

    #[test]
    fn test_effective_admin_truth_table() {
        let allowlist = AdminAllowlist::new(["root@example.com"]);

        assert!(effective_admin(true, "ada@example.com", &allowlist));
        assert!(effective_admin(false, "root@example.com", &allowlist));
        assert!(effective_admin(true, "root@example.com", &allowlist));
        assert!(!effective_admin(false, "ada@example.com", &allowlist));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&context("root@example.com", true)).is_ok());
        assert_eq!(
            require_admin(&context("ada@example.com", false)),
            Err(AuthzError::AdminRequired)
        );
    }

    #[test]
    fn test_require_not_self() {
        let auth = context("root@example.com", true);
        assert_eq!(require_not_self(&auth, "ROOT@example.com"), Err(AuthzError::SelfDeletion));
        assert!(require_not_self(&auth, "ada@example.com").is_ok());
    }
}
