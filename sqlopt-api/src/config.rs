/// Configuration management for the API server
///
/// Loads configuration from environment variables (and a `.env` file when
/// present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `DATABASE_URL`: Postgres or SQLite connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Session token signing key, at least 32 characters (required)
/// - `SESSION_TTL_HOURS`: Session token lifetime (default: 168)
/// - `OPENAI_API_KEY`: Completion API key (required)
/// - `OPENAI_BASE_URL`: Completion API base (default: https://api.openai.com/v1)
/// - `OPENAI_MODEL`: Model name (default: gpt-4o-mini)
/// - `OPENAI_TIMEOUT_SECONDS`: Request timeout (default: 60)
/// - `ADMIN_EMAILS`: Comma-separated admin allowlist (default: empty)
/// - `CORS_ORIGINS`: Comma-separated origins, or `*` (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use sqlopt_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Completion API configuration
    pub openai: OpenAiSettings,

    /// Emails that are always admins
    pub admin_emails: Vec<String>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (adds HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres or SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for session token signing
    ///
    /// Must be at least 32 characters. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Token lifetime in hours
    pub session_ttl_hours: i64,
}

/// Completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(skip_serializing)]
    pub api_key: String,

    pub base_url: String,

    pub model: String,

    pub timeout_seconds: u64,
}

/// Reads an optional variable, falling back to `default`
fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        _ => Ok(default),
    }
}

/// Splits a comma-separated list, dropping empty entries
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or `JWT_SECRET` is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable is required"))?;

        let cors_origins = split_list(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("API_PORT", 8080u16)?,
                cors_origins: if cors_origins.is_empty() {
                    vec!["*".to_string()]
                } else {
                    cors_origins
                },
                production: var_or("PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10u32)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                session_ttl_hours: var_or("SESSION_TTL_HOURS", 168i64)?,
            },
            openai: OpenAiSettings {
                api_key: openai_api_key,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                timeout_seconds: var_or("OPENAI_TIMEOUT_SECONDS", 60u64)?,
            },
            admin_emails: split_list(&env::var("ADMIN_EMAILS").unwrap_or_default()),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Configuration for tests and local experiments
    ///
    /// Uses an in-memory SQLite database and a fixed signing secret.
    pub fn for_testing() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                session_ttl_hours: 168,
            },
            openai: OpenAiSettings {
                api_key: "sk-test".to_string(),
                base_url: "http://localhost:9/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_seconds: 5,
            },
            admin_emails: vec!["admin@example.com".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_testing();
        config.api.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" a@example.com, ,b@example.com,"),
            vec!["a@example.com", "b@example.com"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let json = serde_json::to_string(&Config::for_testing()).unwrap();
        assert!(!json.contains("test-secret-key"));
        assert!(!json.contains("sk-test"));
    }
}
