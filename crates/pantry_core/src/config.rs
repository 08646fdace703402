use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PantryConfig {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub corpus: CorpusConfig,
    pub search: SearchConfig,
}

impl PantryConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: PantryConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overrides are read through `lookup` so tests don't have to touch the process env.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(n) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = n;
        }
        if let Some(n) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.llm.temperature = n;
        }
        if let Some(n) = lookup("PANTRY_MAX_STEPS").and_then(|v| v.parse().ok()) {
            self.agent.max_steps = n;
        }
        if let Some(v) = lookup("PANTRY_CORPUS") {
            self.corpus.path = PathBuf::from(v);
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" for any OpenAI-compatible endpoint, "mock" for offline runs.
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            max_tokens: 512,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

/// Step budget and tool allow-list for agent runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_steps: usize,
    /// `finish` never needs to be listed here.
    pub allow_tools: Vec<String>,
    /// Only changes how loudly steps are logged.
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 6,
            allow_tools: vec!["search".to_string()],
            verbose: true,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_steps must be a positive integer")]
    InvalidMaxSteps,
    #[error("allow_tools names an unregistered tool: {0}")]
    UnknownTool(String),
}

impl AgentConfig {
    pub fn new(max_steps: usize, allow_tools: &[&str], verbose: bool) -> Self {
        Self {
            max_steps,
            allow_tools: allow_tools.iter().map(|s| s.to_string()).collect(),
            verbose,
        }
    }

    pub fn allows(&self, tool: &str) -> bool {
        self.allow_tools.iter().any(|t| t == tool)
    }

    /// Check the budget and that every allowed name exists in `registered`.
    pub fn validate(&self, registered: &[&str]) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidMaxSteps);
        }
        if let Some(unknown) = self
            .allow_tools
            .iter()
            .find(|t| !registered.contains(&t.as_str()))
        {
            return Err(ConfigError::UnknownTool(unknown.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
    /// Prefix for ids synthesized from the row index when a record has none.
    pub id_prefix: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/recipes.json"),
            id_prefix: "recipe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_k: usize,
    pub snippet_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 3,
            snippet_chars: 240,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = PantryConfig::default();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.agent.max_steps, 6);
        assert_eq!(cfg.agent.allow_tools, vec!["search".to_string()]);
        assert!(cfg.agent.verbose);
        assert_eq!(cfg.search.default_k, 3);
        assert_eq!(cfg.search.snippet_chars, 240);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[agent]
max_steps = 3
"#;
        let cfg: PantryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.agent.max_steps, 3);
        // Defaults for unspecified fields
        assert_eq!(cfg.agent.allow_tools, vec!["search".to_string()]);
        assert_eq!(cfg.llm.max_tokens, 512);
        assert_eq!(cfg.corpus.id_prefix, "recipe");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[llm]
provider = "mock"
model = "scripted"
base_url = "http://localhost:11434/v1"
max_tokens = 1024
temperature = 0.3

[agent]
max_steps = 10
allow_tools = ["search"]
verbose = false

[corpus]
path = "/tmp/corpus.jsonl"
id_prefix = "doc"

[search]
default_k = 5
snippet_chars = 80
"#;
        let cfg: PantryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert!(!cfg.agent.verbose);
        assert_eq!(cfg.corpus.path, PathBuf::from("/tmp/corpus.jsonl"));
        assert_eq!(cfg.search.default_k, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LLM_PROVIDER", "mock"),
            ("LLM_MAX_TOKENS", "2048"),
            ("LLM_TEMPERATURE", "not-a-number"),
            ("PANTRY_MAX_STEPS", "4"),
            ("PANTRY_CORPUS", "other.json"),
        ]
        .into_iter()
        .collect();
        let mut cfg = PantryConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.max_tokens, 2048);
        // Unparseable values leave the default in place
        assert_eq!(cfg.llm.temperature, 0.0);
        assert_eq!(cfg.agent.max_steps, 4);
        assert_eq!(cfg.corpus.path, PathBuf::from("other.json"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pantry.toml");
        std::fs::write(&path, "[search]\ndefault_k = 7\n").unwrap();
        let cfg = PantryConfig::load(&path).unwrap();
        assert_eq!(cfg.search.default_k, 7);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let cfg = PantryConfig::load_or_default("/nonexistent/pantry_config_12345.toml");
        assert_eq!(cfg.search.snippet_chars, 240);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[agent\nmax_steps = ").unwrap();
        assert!(PantryConfig::load(&path).is_err());
    }

    #[test]
    fn test_agent_validate() {
        let registered = ["search", "finish"];
        assert!(AgentConfig::default().validate(&registered).is_ok());
        assert_eq!(
            AgentConfig::new(0, &["search"], false).validate(&registered),
            Err(ConfigError::InvalidMaxSteps)
        );
        assert_eq!(
            AgentConfig::new(3, &["search", "delete"], false).validate(&registered),
            Err(ConfigError::UnknownTool("delete".into()))
        );
    }

    #[test]
    fn test_allows() {
        let cfg = AgentConfig::default();
        assert!(cfg.allows("search"));
        assert!(!cfg.allows("finish"));
        assert!(!cfg.allows("delete"));
        assert!(!AgentConfig::new(3, &[], false).allows("search"));
    }
}
