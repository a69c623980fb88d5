/// Daily analysis quota for non-admin sessions
///
/// Each non-admin session may dispatch a fixed number of analyses per rolling
/// window. The window starts at login and is refreshed lazily: every
/// authenticated request calls [`QuotaWindow::refresh`], which resets the
/// counter once the reset timestamp has passed.
///
/// # Limits
///
/// - Analyses per window: 5
/// - Window length: 24 hours
/// - Admin sessions: unlimited
///
/// The counter lives in the in-process session store only. It is not shared
/// between sessions and does not survive a restart.
///
/// # Example
///
/// ```
/// use sqlopt_shared::quota::QuotaWindow;
/// use chrono::{Duration, Utc};
///
/// let start = Utc::now();
/// let mut window = QuotaWindow::new(start);
///
/// for _ in 0..5 {
///     window.try_consume(start).unwrap();
/// }
/// assert!(window.try_consume(start).is_err());
///
/// // A day later the counter resets
/// let later = start + Duration::hours(24);
/// window.refresh(later);
/// assert!(window.check(later).allowed);
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Maximum analyses per window for non-admin sessions
pub const DAILY_LIMIT: u32 = 5;

/// Length of a quota window in hours
pub const WINDOW_HOURS: i64 = 24;

/// Quota enforcement error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    /// Daily limit reached
    LimitExceeded {
        limit: u32,
        current: u32,
        reset_at: DateTime<Utc>,
    },
}

impl QuotaError {
    /// Seconds until the window resets, at least 1
    pub fn retry_after(&self, now: DateTime<Utc>) -> u64 {
        match self {
            QuotaError::LimitExceeded { reset_at, .. } => {
                (*reset_at - now).num_seconds().max(1) as u64
            }
        }
    }
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::LimitExceeded { .. } => {
                write!(f, "Daily query limit reached. Limit resets in 24 hours.")
            }
        }
    }
}

impl std::error::Error for QuotaError {}

/// Result of a quota check
#[derive(Debug, Clone, Serialize)]
pub struct QuotaCheckResult {
    /// Whether another analysis may be dispatched
    pub allowed: bool,

    /// Analyses dispatched in the current window
    pub current: u32,

    /// Maximum allowed
    pub limit: u32,

    /// Remaining analyses
    pub remaining: u32,

    /// When the counter resets
    pub reset_at: DateTime<Utc>,
}

impl QuotaCheckResult {
    /// Creates a result indicating quota is available
    pub fn allowed(current: u32, limit: u32, reset_at: DateTime<Utc>) -> Self {
        QuotaCheckResult {
            allowed: true,
            current,
            limit,
            remaining: limit.saturating_sub(current),
            reset_at,
        }
    }

    /// Creates a result indicating quota is exhausted
    pub fn exceeded(current: u32, limit: u32, reset_at: DateTime<Utc>) -> Self {
        QuotaCheckResult {
            allowed: false,
            current,
            limit,
            remaining: 0,
            reset_at,
        }
    }
}

/// Per-session counter with a lazily refreshed reset timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaWindow {
    /// Analyses dispatched since `reset_at - 24h`
    pub count: u32,

    /// When the counter next resets
    pub reset_at: DateTime<Utc>,
}

impl QuotaWindow {
    /// Starts a fresh window at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        QuotaWindow {
            count: 0,
            reset_at: now + Duration::hours(WINDOW_HOURS),
        }
    }

    /// Resets the counter if the window has elapsed
    ///
    /// Returns `true` when a reset happened.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + Duration::hours(WINDOW_HOURS);
            true
        } else {
            false
        }
    }

    /// Reports the current state without consuming
    pub fn check(&self, now: DateTime<Utc>) -> QuotaCheckResult {
        let mut window = self.clone();
        window.refresh(now);

        if window.count >= DAILY_LIMIT {
            QuotaCheckResult::exceeded(window.count, DAILY_LIMIT, window.reset_at)
        } else {
            QuotaCheckResult::allowed(window.count, DAILY_LIMIT, window.reset_at)
        }
    }

    /// Counts one dispatched analysis, or fails if the limit is reached
    ///
    /// # Errors
    ///
    /// Returns `QuotaError::LimitExceeded` once `count >= DAILY_LIMIT`
    pub fn try_consume(&mut self, now: DateTime<Utc>) -> Result<QuotaCheckResult, QuotaError> {
        self.refresh(now);

        if self.count >= DAILY_LIMIT {
            return Err(QuotaError::LimitExceeded {
                limit: DAILY_LIMIT,
                current: self.count,
                reset_at: self.reset_at,
            });
        }

        self.count += 1;
        Ok(QuotaCheckResult::allowed(self.count, DAILY_LIMIT, self.reset_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_new_window() {
        let window = QuotaWindow::new(start());
        assert_eq!(window.count, 0);
        assert_eq!(window.reset_at, start() + Duration::hours(24));
    }

    #[test]
    fn test_limit_reached_after_five() {
        let now = start();
        let mut window = QuotaWindow::new(now);

        for expected in 1..=5 {
            let result = window.try_consume(now).expect("within quota");
            assert_eq!(result.current, expected);
        }

        assert!(!window.check(now).allowed);
        let err = window.try_consume(now).unwrap_err();
        assert!(matches!(err, QuotaError::LimitExceeded { current: 5, limit: 5, .. }));
        assert_eq!(window.count, 5);
    }

    #[test]
    fn test_refresh_before_reset_keeps_count() {
        let now = start();
        let mut window = QuotaWindow::new(now);
        window.try_consume(now).unwrap();

        assert!(!window.refresh(now + Duration::hours(23)));
        assert_eq!(window.count, 1);
    }

    #[test]
    fn test_refresh_after_reset_clears_count() {
        let now = start();
        let mut window = QuotaWindow::new(now);
        for _ in 0..5 {
            window.try_consume(now).unwrap();
        }

        let later = now + Duration::hours(24) + Duration::seconds(1);
        assert!(window.refresh(later));
        assert_eq!(window.count, 0);
        assert_eq!(window.reset_at, later + Duration::hours(24));
        assert!(window.try_consume(later).is_ok());
    }

    #[test]
    fn test_check_does_not_mutate() {
        let now = start();
        let mut window = QuotaWindow::new(now);
        window.try_consume(now).unwrap();

        let before = window.clone();
        let result = window.check(now + Duration::hours(30));
        assert!(result.allowed);
        assert_eq!(result.current, 0);
        assert_eq!(window, before);
    }

    #[test]
    fn test_check_result_remaining() {
        let reset = start();
        let result = QuotaCheckResult::allowed(2, 5, reset);
        assert_eq!(result.remaining, 3);

        let result = QuotaCheckResult::exceeded(5, 5, reset);
        assert_eq!(result.remaining, 0);
    }

    #[test]
    fn test_quota_error_display_and_retry_after() {
        let now = start();
        let err = QuotaError::LimitExceeded {
            limit: 5,
            current: 5,
            reset_at: now + Duration::hours(2),
        };
        assert_eq!(
            err.to_string(),
            "Daily query limit reached. Limit resets in 24 hours."
        );
        assert_eq!(err.retry_after(now), 7200);
        assert_eq!(err.retry_after(now + Duration::hours(3)), 1);
    }
}
