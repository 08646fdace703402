use pantry_core::{AgentConfig, Step, ToolSpec};
use std::fmt::Write;

use crate::registry::{ToolKind, ToolRegistry};

pub const QUESTION_PREFIX: &str = "Question: ";
pub const OBSERVATION_PREFIX: &str = "Observation: ";

/// Turns the question and the steps taken so far into the next model prompt.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, question: &str, steps: &[Step]) -> String;
}

/// Default Thought/Action/Observation prompt.
pub struct ReActPrompt {
    tools: Vec<ToolSpec>,
}

impl ReActPrompt {
    pub fn new(tools: Vec<ToolSpec>) -> Self {
        Self { tools }
    }

    /// Advertise the allowed tools plus `finish`, which every run may use.
    pub fn for_agent(registry: &ToolRegistry, config: &AgentConfig) -> Self {
        let tools = ToolKind::ALL
            .into_iter()
            .filter(|kind| kind.is_terminal() || config.allows(kind.name()))
            .map(|kind| registry.spec(kind))
            .collect();
        Self::new(tools)
    }
}

fn signature(spec: &ToolSpec) -> String {
    let Some(props) = spec.input_schema.properties.as_object() else {
        return format!("{}[]", spec.name);
    };
    // Required parameters first, in declared order, then the optional ones.
    let required = &spec.input_schema.required;
    let mut keys: Vec<&String> = props.keys().collect();
    let rank = |key: &String| required.iter().position(|r| r == key).unwrap_or(usize::MAX);
    keys.sort_by(|a, b| rank(*a).cmp(&rank(*b)).then_with(|| a.cmp(b)));
    let params = keys
        .into_iter()
        .map(|key| match props[key.as_str()]["type"].as_str() {
            Some("integer") => format!("{key}=<int>"),
            _ => format!("{key}=\"...\""),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}[{}]", spec.name, params)
}

impl PromptBuilder for ReActPrompt {
    fn build(&self, question: &str, steps: &[Step]) -> String {
        let mut prompt = String::from(
            "You answer questions using a searchable knowledge base. Work step by step.\n\
             On every turn reply with exactly two lines:\n\
             Thought: <your reasoning>\n\
             Action: <tool>[key=\"value\", ...]\n\n\
             Available tools:\n",
        );
        for spec in &self.tools {
            let _ = writeln!(prompt, "- {}: {}", signature(spec), spec.description);
        }
        let _ = write!(prompt, "\n{QUESTION_PREFIX}{question}\n");
        for (i, step) in steps.iter().enumerate() {
            let _ = write!(
                prompt,
                "\nStep {}:\nThought: {}\n{}\n{OBSERVATION_PREFIX}{}\n",
                i + 1,
                step.thought,
                step.action,
                step.observation
            );
        }
        let _ = write!(prompt, "\nStep {}:\n", steps.len() + 1);
        prompt
    }
}
