/// Core completion client trait and types
///
/// A client takes one prompt and returns the model's text. There is no
/// retry, no streaming and no partial result: a call either yields a
/// [`Completion`] or a [`CompletionError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling temperature used for every analysis
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Response length cap used for every analysis
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Completion error types
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Request could not be sent or the connection failed
    #[error("Request failed: {0}")]
    Transport(String),

    /// Request exceeded the client timeout
    #[error("Request timed out")]
    Timeout,

    /// Provider answered with a non-success status
    #[error("Completion API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),

    /// Client could not be built
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::Timeout
        } else if e.is_decode() {
            CompletionError::InvalidResponse(e.to_string())
        } else {
            CompletionError::Transport(e.to_string())
        }
    }
}

/// Completion result type alias
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Single-message completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Full prompt, sent as one user-role message
    pub prompt: String,

    pub temperature: f32,

    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with the default sampling parameters
    pub fn new(prompt: impl Into<String>) -> Self {
        CompletionRequest {
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Model output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Content of the first choice, unmodified
    pub text: String,

    /// Total tokens reported by the provider, if any
    pub tokens_used: Option<i64>,
}

/// Chat-completion client
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier, used in logs
    fn model(&self) -> &str;

    /// Sends one prompt and returns the model's answer
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = CompletionRequest::new("Explain: SELECT 1");
        assert_eq!(request.prompt, "Explain: SELECT 1");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 1500);
    }

    #[test]
    fn test_api_error_display() {
        let err = CompletionError::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Completion API error (429): rate limited");
    }
}
