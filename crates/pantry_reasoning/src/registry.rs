use pantry_core::{ToolError, ToolInputSchema, ToolSpec};
use pantry_retrieval::{RetrievalIndex, SearchHit};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

// ============================================================================
// ToolKind
// ============================================================================

/// Every tool the agent can call. Adding one means extending the matches below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
    Finish,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::Search, ToolKind::Finish];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Search => "search",
            ToolKind::Finish => "finish",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Terminal tools end the run instead of producing an observation.
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolKind::Finish)
    }
}

/// Structured result of a tool call; serialized as the step observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolOutput {
    Search {
        query: String,
        results: Vec<SearchHit>,
    },
    Finish {
        answer: String,
    },
}

// ============================================================================
// ToolRegistry
// ============================================================================

/// Name -> schema + behavior for the built-in tools. Holds no policy: the
/// agent decides which of these a run may use.
pub struct ToolRegistry {
    index: Arc<RetrievalIndex>,
    default_k: usize,
}

impl ToolRegistry {
    pub const DEFAULT_K: usize = 3;

    pub fn new(index: Arc<RetrievalIndex>) -> Self {
        Self {
            index,
            default_k: Self::DEFAULT_K,
        }
    }

    pub fn with_default_k(mut self, default_k: usize) -> Self {
        self.default_k = default_k;
        self
    }

    pub fn index(&self) -> &Arc<RetrievalIndex> {
        &self.index
    }

    pub fn names(&self) -> Vec<&'static str> {
        ToolKind::ALL.iter().map(|k| k.name()).collect()
    }

    pub fn resolve(&self, name: &str) -> Result<ToolKind, ToolError> {
        ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn spec(&self, kind: ToolKind) -> ToolSpec {
        match kind {
            ToolKind::Search => ToolSpec {
                name: kind.name().to_string(),
                description: format!(
                    "Look up documents in the knowledge base by keywords. Returns up to k results (default {}) with id, title, snippet and total_time.",
                    self.default_k
                ),
                input_schema: ToolInputSchema::object(
                    json!({
                        "query": {"type": "string", "description": "Keywords to search for"},
                        "k": {"type": "integer", "description": "Number of results"}
                    }),
                    &["query"],
                ),
            },
            ToolKind::Finish => ToolSpec {
                name: kind.name().to_string(),
                description: "Give the final answer and stop.".to_string(),
                input_schema: ToolInputSchema::object(
                    json!({
                        "answer": {"type": "string", "description": "The final answer"}
                    }),
                    &["answer"],
                ),
            },
        }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        ToolKind::ALL.iter().map(|&k| self.spec(k)).collect()
    }

    /// Resolve `name` and run it.
    pub fn dispatch(&self, name: &str, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let kind = self.resolve(name)?;
        self.invoke(kind, args)
    }

    pub fn invoke(&self, kind: ToolKind, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        match kind {
            ToolKind::Search => self.search(args),
            ToolKind::Finish => finish(args),
        }
    }

    fn search(&self, args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        const TOOL: &str = "search";
        reject_unexpected(TOOL, args, &["query", "k"])?;
        let query = required_text(TOOL, args, "query")?;
        let k = match args.get("k") {
            None | Some(Value::Null) => self.default_k,
            Some(v) => as_count(v).ok_or_else(|| {
                ToolError::invalid(TOOL, format!("k must be an integer, got {v}"))
            })?,
        };
        let results = self.index.search(&query, k);
        tracing::debug!("search '{}' (k={}) -> {} hit(s)", query, k, results.len());
        Ok(ToolOutput::Search { query, results })
    }
}

fn finish(args: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
    const TOOL: &str = "finish";
    reject_unexpected(TOOL, args, &["answer"])?;
    let answer = required_text(TOOL, args, "answer")?;
    Ok(ToolOutput::Finish { answer })
}

fn reject_unexpected(tool: &str, args: &Map<String, Value>, known: &[&str]) -> Result<(), ToolError> {
    match args.keys().find(|k| !known.contains(&k.as_str())) {
        Some(extra) => Err(ToolError::invalid(tool, format!("unexpected argument '{extra}'"))),
        None => Ok(()),
    }
}

fn required_text(tool: &str, args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        _ => Err(ToolError::invalid(
            tool,
            format!("missing required argument '{key}'"),
        )),
    }
}

/// Integer-like values as a result count; negatives clamp to zero.
fn as_count(value: &Value) -> Option<usize> {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(n.max(0) as usize)
}
