pub mod agent;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod providers;
pub mod registry;

pub use agent::{recover_answer, ReActAgent};
pub use llm::LlmClient;
pub use parser::{parse_action, split_turn, ParsedAction, Turn};
pub use prompts::{PromptBuilder, ReActPrompt};
pub use registry::{ToolKind, ToolOutput, ToolRegistry};
