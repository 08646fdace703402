pub mod config;
pub mod document;
pub mod tools;
pub mod trajectory;

pub use config::{AgentConfig, ConfigError, CorpusConfig, LlmConfig, PantryConfig, SearchConfig};
pub use document::Document;
pub use tools::{ToolError, ToolInputSchema, ToolSpec};
pub use trajectory::{RunResult, RunState, Step, Trajectory};
