/// Chat-completion clients
///
/// Analysis goes through the [`CompletionClient`] trait so request handling
/// never depends on a concrete provider.
///
/// # Clients
///
/// - **OpenAI**: Any OpenAI-compatible `/chat/completions` endpoint
/// - **Mock**: Scripted responses for tests and offline demos
///
/// # Example
///
/// ```no_run
/// use sqlopt_shared::llm::{CompletionClient, CompletionRequest, OpenAiClient, OpenAiConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OpenAiClient::new(OpenAiConfig {
///     api_key: std::env::var("OPENAI_API_KEY")?,
///     ..Default::default()
/// })?;
///
/// let completion = client
///     .complete(CompletionRequest::new("Explain: SELECT 1"))
///     .await?;
/// println!("{}", completion.text);
/// # Ok(())
/// # }
/// ```

pub mod client_trait;
pub mod mock;
pub mod openai;

pub use client_trait::{
    Completion, CompletionClient, CompletionError, CompletionRequest, CompletionResult,
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use mock::MockCompletionClient;
pub use openai::{OpenAiClient, OpenAiConfig};
