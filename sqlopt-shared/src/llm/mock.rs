/// Mock completion client for tests and offline demos
///
/// Replies are scripted in order. When the script runs out the client falls
/// back to echoing a fixed answer, so a mock built with
/// [`MockCompletionClient::new`] always succeeds.
///
/// # Example
///
/// ```
/// use sqlopt_shared::llm::{CompletionClient, CompletionRequest, MockCompletionClient};
///
/// # async fn example() {
/// let mock = MockCompletionClient::new();
/// mock.push_failure("upstream unavailable");
///
/// assert!(mock.complete(CompletionRequest::new("Explain: SELECT 1")).await.is_err());
/// assert!(mock.complete(CompletionRequest::new("Explain: SELECT 1")).await.is_ok());
/// assert_eq!(mock.requests().len(), 2);
/// # }
/// ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::client_trait::{
    Completion, CompletionClient, CompletionError, CompletionRequest, CompletionResult,
};

/// Answer returned once the script is empty
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock analysis: the query looks fine.";

enum Scripted {
    Reply(Completion),
    Fail(String),
}

/// Scripted completion client
#[derive(Clone, Default)]
pub struct MockCompletionClient {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply
    pub fn push_response(&self, text: impl Into<String>, tokens_used: Option<i64>) {
        self.lock_script().push_back(Scripted::Reply(Completion {
            text: text.into(),
            tokens_used,
        }));
    }

    /// Queues a transport failure
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_script().push_back(Scripted::Fail(message.into()));
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for MockCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCompletionClient")
            .field("pending", &self.lock_script().len())
            .finish()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        match self.lock_script().pop_front() {
            Some(Scripted::Reply(completion)) => Ok(completion),
            Some(Scripted::Fail(message)) => Err(CompletionError::Transport(message)),
            None => Ok(Completion {
                text: DEFAULT_MOCK_RESPONSE.to_string(),
                tokens_used: Some(100),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockCompletionClient::new();
        mock.push_response("first", Some(10));
        mock.push_failure("boom");

        let first = mock.complete(CompletionRequest::new("a")).await.unwrap();
        assert_eq!(first.text, "first");
        assert_eq!(first.tokens_used, Some(10));

        let err = mock.complete(CompletionRequest::new("b")).await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed: boom");

        let fallback = mock.complete(CompletionRequest::new("c")).await.unwrap();
        assert_eq!(fallback.text, DEFAULT_MOCK_RESPONSE);

        let prompts: Vec<String> = mock.requests().into_iter().map(|r| r.prompt).collect();
        assert_eq!(prompts, vec!["a", "b", "c"]);
    }
}
