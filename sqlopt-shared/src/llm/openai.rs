/// OpenAI-compatible chat-completion client
///
/// Posts to `{base_url}/chat/completions` with a bearer key:
///
/// ```json
/// {
///   "model": "gpt-4o-mini",
///   "messages": [{"role": "user", "content": "<prompt>"}],
///   "temperature": 0.3,
///   "max_tokens": 1500
/// }
/// ```
///
/// Only `choices[0].message.content` and `usage.total_tokens` are read from
/// the response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::client_trait::{
    Completion, CompletionClient, CompletionError, CompletionRequest, CompletionResult,
};

/// Default API base
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Client configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,

    /// Base URL without the trailing `/chat/completions`
    pub base_url: String,

    pub model: String,

    /// Whole-request timeout (seconds)
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<i64>,
}

/// OpenAI chat-completion client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Builds a client with a request timeout
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Configuration` if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> CompletionResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CompletionError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Extracts the first choice and token usage from a response body
fn parse_response(body: ChatResponse) -> CompletionResult<Completion> {
    let text = body
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::InvalidResponse("response has no choices".to_string()))?;

    Ok(Completion {
        text,
        tokens_used: body.usage.and_then(|usage| usage.total_tokens),
    })
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            model = %self.model,
            prompt_chars = request.prompt.chars().count(),
            "Sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Completion API returned an error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion = parse_response(response.json::<ChatResponse>().await?)?;

        debug!(tokens_used = ?completion.tokens_used, "Completion received");
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OpenAiClient::new(OpenAiConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:9000/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.endpoint(), "http://localhost:9000/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest::new("Explain: SELECT 1");
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Explain: SELECT 1");
        assert_eq!(json["max_tokens"], 1500);
        assert!((json["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_parse_response_reads_first_choice() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "It selects one."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        let completion = parse_response(body).unwrap();
        assert_eq!(completion.text, "It selects one.");
        assert_eq!(completion.tokens_used, Some(15));
    }

    #[test]
    fn test_parse_response_without_usage() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "ok"}}]
        }))
        .unwrap();

        assert_eq!(parse_response(body).unwrap().tokens_used, None);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(
            parse_response(body),
            Err(CompletionError::InvalidResponse(_))
        ));
    }
}
