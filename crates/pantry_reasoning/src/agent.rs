use anyhow::{Context, Result};
use pantry_core::{AgentConfig, RunResult, RunState, Step, ToolError, Trajectory};
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::llm::LlmClient;
use crate::parser::{parse_action, split_turn, Turn};
use crate::prompts::{PromptBuilder, ReActPrompt};
use crate::registry::{ToolKind, ToolRegistry};

pub const PARSE_ERROR_OBSERVATION: &str = "Invalid action format. Stopping.";
pub const FINISH_OBSERVATION: &str = "done";
pub const NO_ANSWER: &str = "No answer provided";

static RE_FINISH_CALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"finish\s*\[").unwrap());

// Tried in order against each finish action, newest step first. The first
// pattern that matches decides the step's answer, even when it is empty.
static RE_ANSWER_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"answer="([^"]*)""#).unwrap(),
        Regex::new(r"answer='([^']*)'").unwrap(),
        Regex::new(r"answer=([^,\]]+)").unwrap(),
    ]
});

// ============================================================================
// ReActAgent
// ============================================================================

/// Drives the Thought → Action → Observation loop for one question at a time.
///
/// The agent itself is immutable; each `run` owns its own trajectory, so one
/// agent can serve concurrent runs over the same shared index.
pub struct ReActAgent {
    client: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    prompt: Arc<dyn PromptBuilder>,
    config: AgentConfig,
}

impl ReActAgent {
    pub fn new(client: Arc<dyn LlmClient>, registry: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        let prompt = Arc::new(ReActPrompt::for_agent(&registry, &config));
        Self {
            client,
            registry,
            prompt,
            config,
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn PromptBuilder>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer `question`. Every terminal state yields `Ok` with the full
    /// trajectory; only a failed model call is an `Err`.
    #[tracing::instrument(skip(self), fields(max_steps = self.config.max_steps))]
    pub async fn run(&self, question: &str) -> Result<RunResult> {
        let mut trajectory = Trajectory::new();
        let mut state = RunState::Running;

        while trajectory.len() < self.config.max_steps {
            let step_no = trajectory.len() + 1;
            let prompt = self.prompt.build(question, trajectory.steps());
            let output = self
                .client
                .complete(&prompt)
                .await
                .with_context(|| format!("LLM call failed at step {step_no}"))?;

            let turn = split_turn(&output);
            if turn.missing_action {
                tracing::warn!(
                    "Step {}: model output had no action line, finishing with \"(no action)\"",
                    step_no
                );
            }

            let (observation, next) = self.advance(&turn);
            let step = Step::new(turn.thought, turn.action, observation);
            self.log_step(step_no, &step);
            trajectory.push(step);

            if let Some(next) = next {
                state = next;
                break;
            }
        }

        if !state.is_terminal() {
            state = RunState::StoppedMaxSteps;
        }

        let final_answer = match &state {
            RunState::Finished { answer, .. } => Some(answer.clone()),
            _ => {
                let recovered = recover_answer(trajectory.steps());
                if let Some(answer) = &recovered {
                    tracing::info!("Recovered answer from trajectory: {}", answer);
                }
                recovered
            }
        };

        tracing::info!(
            "Run ended: {} after {} step(s)",
            state.label(),
            trajectory.len()
        );

        Ok(RunResult {
            question: question.to_string(),
            final_answer,
            steps: trajectory.into_steps(),
            state,
        })
    }

    /// Observation for this turn, plus the terminal state if the run ends here.
    fn advance(&self, turn: &Turn) -> (String, Option<RunState>) {
        let Some(action) = parse_action(&turn.action) else {
            return (
                PARSE_ERROR_OBSERVATION.to_string(),
                Some(RunState::StoppedParseError),
            );
        };

        // finish is checked ahead of the allow-list.
        if action.name == ToolKind::Finish.name() {
            let answer = action
                .arg_text("answer")
                .unwrap_or_else(|| NO_ANSWER.to_string());
            return (
                FINISH_OBSERVATION.to_string(),
                Some(RunState::Finished {
                    answer,
                    fallback: turn.missing_action,
                }),
            );
        }

        let kind = match self.registry.resolve(&action.name) {
            Ok(kind) if self.config.allows(kind.name()) => kind,
            _ => {
                tracing::warn!("Rejected action '{}'", action.name);
                return (
                    format!("Action '{}' not allowed or not found.", action.name),
                    Some(RunState::StoppedDisallowedTool),
                );
            }
        };

        let outcome = self.registry.invoke(kind, &action.args).and_then(|output| {
            serde_json::to_string(&output).map_err(|e| ToolError::Execution(e.to_string()))
        });
        let observation = match outcome {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Tool '{}' failed: {}", action.name, e);
                format!("Tool error: {e}")
            }
        };
        (observation, None)
    }

    fn log_step(&self, step_no: usize, step: &Step) {
        if self.config.verbose {
            tracing::info!(
                "Step {}: thought={:?} action={:?} observation={:?}",
                step_no,
                step.thought,
                step.action,
                step.observation
            );
        } else {
            tracing::debug!(
                "Step {}: thought={:?} action={:?} observation={:?}",
                step_no,
                step.thought,
                step.action,
                step.observation
            );
        }
    }
}

/// Best-effort answer from the latest finish action in `steps`.
///
/// Only consulted when a run ends without reaching `Finished`; it never
/// changes the run's state.
pub fn recover_answer(steps: &[Step]) -> Option<String> {
    steps
        .iter()
        .rev()
        .filter(|step| RE_FINISH_CALL.is_match(&step.action))
        .find_map(|step| {
            RE_ANSWER_PATTERNS
                .iter()
                .find_map(|re| re.captures(&step.action))
                .map(|c| c[1].trim().to_string())
                .filter(|answer| !answer.is_empty())
        })
}
