/// Server-side session store
///
/// Every login creates a [`Session`] keyed by a random session ID. The ID is
/// carried inside the signed session token; the store holds everything that
/// changes during a session:
///
/// - identity (email, name, effective admin flag)
/// - the daily [`QuotaWindow`]
/// - the SQL currently loaded in the optimizer
/// - the last analysis result, for download
/// - the admin analytics cache
///
/// The store is an in-process `RwLock<HashMap>`. Sessions are lost on
/// restart, which also resets every quota counter. A session expires with
/// its token: [`SessionStore::touch`] drops an expired entry instead of
/// returning it, and every [`SessionStore::create`] prunes expired entries.
///
/// # Example
///
/// ```
/// use sqlopt_shared::auth::session::SessionStore;
/// use chrono::Utc;
///
/// # async fn example() {
/// let sessions = SessionStore::new();
/// let session = sessions.create("ada@example.com", "Ada", false, Utc::now()).await;
///
/// let found = sessions.touch(session.id, Utc::now()).await.unwrap();
/// assert_eq!(found.email, "ada@example.com");
///
/// sessions.remove(session.id).await;
/// assert!(sessions.get(session.id).await.is_none());
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::analytics::CachedSummary;
use crate::auth::jwt::DEFAULT_TTL_HOURS;
use crate::nl::GeneratedQuery;
use crate::prompt::TaskType;
use crate::quota::QuotaWindow;

/// Most recent analysis result kept for download
#[derive(Debug, Clone)]
pub struct LastResult {
    /// Task that produced the result
    pub task: TaskType,

    /// Model response, unmodified
    pub text: String,

    /// History row written for the result, if any
    pub history_id: Option<i64>,
}

/// Per-login state
#[derive(Debug, Clone)]
pub struct Session {
    /// Session ID (carried in the token's `sid` claim)
    pub id: Uuid,

    /// User email
    pub email: String,

    /// Display name
    pub name: String,

    /// Effective admin flag (stored flag OR allowlist)
    pub is_admin: bool,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session (and its token) stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Daily analysis counter
    pub quota: QuotaWindow,

    /// SQL currently loaded in the optimizer
    pub current_sql: Option<String>,

    /// Last successful analysis
    pub last_result: Option<LastResult>,

    /// Cached analytics summary (admins only)
    pub analytics_cache: Option<CachedSummary>,

    /// Last SQL generated from a question
    pub last_generated: Option<GeneratedQuery>,
}

impl Session {
    /// Creates a session with a fresh quota window
    pub fn new(email: impl Into<String>, name: impl Into<String>, is_admin: bool, now: DateTime<Utc>) -> Self {
        Session {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            is_admin,
            created_at: now,
            expires_at: now + Duration::hours(DEFAULT_TTL_HOURS),
            quota: QuotaWindow::new(now),
            current_sql: None,
            last_result: None,
            analytics_cache: None,
            last_generated: None,
        }
    }

    /// Whether the session has outlived its token
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Shared, cloneable handle to all live sessions
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,

    /// Lifetime given to new sessions
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_TTL_HOURS))
    }
}

impl SessionStore {
    /// Creates an empty store with the default session lifetime
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose sessions live for `ttl`
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Lifetime given to new sessions
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates and stores a new session, returning a snapshot of it
    pub async fn create(
        &self,
        email: impl Into<String>,
        name: impl Into<String>,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Session {
        let mut session = Session::new(email, name, is_admin, now);
        session.expires_at = now + self.ttl;

        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "Pruned expired sessions");
        }

        sessions.insert(session.id, session.clone());
        session
    }

    /// Returns a snapshot of a session
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Refreshes the session's quota window and returns a snapshot
    ///
    /// Called once per authenticated request. An expired session is removed
    /// and `None` is returned.
    pub async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.inner.write().await;
        if sessions.get(&id)?.is_expired(now) {
            sessions.remove(&id);
            return None;
        }

        let session = sessions.get_mut(&id)?;
        session.quota.refresh(now);
        Some(session.clone())
    }

    /// Runs `f` against a session under the write lock
    ///
    /// Returns `None` if the session doesn't exist.
    pub async fn update<F, R>(&self, id: Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.inner.write().await;
        sessions.get_mut(&id).map(f)
    }

    /// Runs `f` against every session belonging to `email`
    ///
    /// Returns the number of sessions touched.
    pub async fn update_for_email<F>(&self, email: &str, mut f: F) -> usize
    where
        F: FnMut(&mut Session),
    {
        let mut sessions = self.inner.write().await;
        let mut touched = 0;
        for session in sessions.values_mut().filter(|s| s.email == email) {
            f(session);
            touched += 1;
        }
        touched
    }

    /// Removes a session
    ///
    /// Returns `true` if it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Removes every session belonging to `email`
    pub async fn remove_for_email(&self, email: &str) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.email != email);
        before - sessions.len()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new();
        let now = Utc::now();
        let session = store.create("ada@example.com", "Ada", true, now).await;

        let found = store.get(session.id).await.expect("session exists");
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(found.name, "Ada");
        assert!(found.is_admin);
        assert_eq!(found.quota.count, 0);
        assert_eq!(found.quota.reset_at, now + Duration::hours(24));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_touch_refreshes_quota() {
        let store = SessionStore::new();
        let now = Utc::now();
        let session = store.create("ada@example.com", "Ada", false, now).await;

        store
            .update(session.id, |s| s.quota.try_consume(now))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.touch(session.id, now).await.unwrap().quota.count, 1);

        let later = now + Duration::hours(25);
        assert_eq!(store.touch(session.id, later).await.unwrap().quota.count, 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped_on_touch() {
        let store = SessionStore::with_ttl(Duration::hours(1));
        let now = Utc::now();
        let session = store.create("ada@example.com", "Ada", false, now).await;
        assert_eq!(session.expires_at, now + Duration::hours(1));

        assert!(store.touch(session.id, now + Duration::minutes(59)).await.is_some());
        assert!(store.touch(session.id, now + Duration::hours(1)).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_prunes_expired_sessions() {
        let store = SessionStore::with_ttl(Duration::hours(1));
        let now = Utc::now();
        for _ in 0..50 {
            store.create("ada@example.com", "Ada", false, now).await;
        }
        assert_eq!(store.len().await, 50);

        let fresh = store
            .create("ada@example.com", "Ada", false, now + Duration::hours(2))
            .await;
        assert_eq!(store.len().await, 1);
        assert!(store.get(fresh.id).await.is_some());
    }

    #[tokio::test]
    async fn test_touch_missing_session() {
        let store = SessionStore::new();
        assert!(store.touch(Uuid::new_v4(), Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn test_update_for_email_and_remove_for_email() {
        let store = SessionStore::new();
        let now = Utc::now();
        store.create("ada@example.com", "Ada", false, now).await;
        store.create("ada@example.com", "Ada", false, now).await;
        let other = store.create("bob@example.com", "Bob", false, now).await;

        let touched = store.update_for_email("ada@example.com", |s| s.is_admin = true).await;
        assert_eq!(touched, 2);
        assert!(!store.get(other.id).await.unwrap().is_admin);

        assert_eq!(store.remove_for_email("ada@example.com").await, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new();
        let session = store.create("ada@example.com", "Ada", false, Utc::now()).await;

        assert!(store.remove(session.id).await);
        assert!(!store.remove(session.id).await);
        assert!(store.is_empty().await);
    }
}
