use anyhow::Result;
use async_trait::async_trait;

/// Text-completion backend: one prompt in, one complete response out.
///
/// Implementations own their own timeouts; the agent loop waits for
/// whatever the call returns and never retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
