use super::LlmError;
use async_trait::async_trait;
use std::time::Duration;

/// Text-completion service driving the agent.
///
/// No structured function calling: the response format is enforced by the
/// prompt and by the response parser.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError>;
}
