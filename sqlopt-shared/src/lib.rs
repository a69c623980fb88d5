//! # SQL Optimizer Shared Library
//!
//! Domain logic for the SQL optimizer service: everything except HTTP
//! routing and process startup.
//!
//! ## Module Organization
//!
//! - `auth`: Passwords, session tokens, server-side sessions, admin checks
//! - `db`: Connection pools and migrations
//! - `store`: Persistence behind the `Store` trait (Postgres, SQLite)
//! - `models`: Database records
//! - `prompt`: Task types and prompt templates
//! - `llm`: Chat-completion clients
//! - `analysis`: One "Analyze" action end to end
//! - `nl`: Plain-English questions to SQL against a stored schema
//! - `quota`: Daily analysis quota
//! - `formatter`: SQL keyword casing and whitespace cleanup
//! - `analytics`: Admin dashboard figures and caching

pub mod analysis;
pub mod analytics;
pub mod auth;
pub mod db;
pub mod formatter;
pub mod llm;
pub mod models;
pub mod nl;
pub mod prompt;
pub mod quota;
pub mod store;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
