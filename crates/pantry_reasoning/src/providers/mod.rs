pub mod mock;
pub mod openai;

pub use mock::{MockProvider, ScriptedProvider};
pub use openai::OpenAiClient;

use crate::llm::LlmClient;
use anyhow::Result;
use pantry_core::LlmConfig;
use std::sync::Arc;

/// Pick a backend by `llm.provider`.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiClient::new(config)?)),
        "ollama" => {
            let mut config = config.clone();
            config
                .base_url
                .get_or_insert_with(|| "http://localhost:11434/v1".to_string());
            Ok(Arc::new(OpenAiClient::new(&config)?))
        }
        "mock" => Ok(Arc::new(MockProvider::new())),
        other => anyhow::bail!("Unknown LLM provider: {}", other),
    }
}
