//! Run records: steps, the trajectory that owns them, and the terminal result.

use serde::{Deserialize, Serialize, Serializer};

/// One reasoning turn: what the model thought, the action it wrote, what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub thought: String,
    pub action: String,
    pub observation: String,
}

impl Step {
    pub fn new(
        thought: impl Into<String>,
        action: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: action.into(),
            observation: observation.into(),
        }
    }
}

/// Append-only log of steps for a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

/// Where the agent loop currently is, or where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Running,
    /// `fallback` is set when the model wrote no action line and the loop
    /// substituted the "(no action)" finish.
    Finished { answer: String, fallback: bool },
    StoppedParseError,
    StoppedDisallowedTool,
    StoppedMaxSteps,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Finished { .. } => "finished",
            Self::StoppedParseError => "stopped_parse_error",
            Self::StoppedDisallowedTool => "stopped_disallowed_tool",
            Self::StoppedMaxSteps => "stopped_max_steps",
        }
    }
}

/// Everything a caller gets back from one agent run, whatever the outcome.
///
/// Serialized with the terminal state flattened to its label under `status`;
/// the finished answer already lives in `final_answer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub question: String,
    pub final_answer: Option<String>,
    pub steps: Vec<Step>,
    #[serde(rename = "status", serialize_with = "serialize_label")]
    pub state: RunState,
}

fn serialize_label<S: Serializer>(state: &RunState, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(state.label())
}
