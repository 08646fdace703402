//! Deterministic providers for tests and offline runs without API keys.

use crate::llm::LlmClient;
use crate::prompts::{OBSERVATION_PREFIX, QUESTION_PREFIX};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Replays canned responses in order; once the script runs out the last
/// response is repeated. Every prompt it receives is kept for inspection.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// A provider that gives the same answer forever.
    pub fn repeating(response: impl Into<String>) -> Self {
        Self::new([response.into()])
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());
        let mut last = self.last.lock().await;
        if let Some(next) = self.script.lock().await.pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// Offline stand-in for a real model: searches for the question on the
/// first turn, then answers with the top result's title.
///
/// Reads the prompt layout written by [`crate::prompts::ReActPrompt`].
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    fn respond(prompt: &str) -> String {
        let last_observation = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(OBSERVATION_PREFIX));

        match last_observation {
            None => {
                let question = prompt
                    .lines()
                    .find_map(|line| line.strip_prefix(QUESTION_PREFIX))
                    .unwrap_or_default();
                format!(
                    "Thought: (mock) I should search the knowledge base.\nAction: search[query=\"{}\"]",
                    question.replace('"', "'")
                )
            }
            Some(observation) => {
                let title = serde_json::from_str::<serde_json::Value>(observation)
                    .ok()
                    .and_then(|v| v["results"][0]["title"].as_str().map(str::to_string));
                match title {
                    Some(title) => format!(
                        "Thought: (mock) The best match is {title}.\nAction: finish[answer=\"{}\"]",
                        title.replace('"', "'")
                    ),
                    None => "Thought: (mock) Nothing relevant was found.\nAction: finish[answer=\"I could not find an answer.\"]".to_string(),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(Self::respond(prompt))
    }
}
