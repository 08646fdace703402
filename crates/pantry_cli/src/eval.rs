//! Batch evaluation: run a list of questions and write one JSON report.

use anyhow::{Context, Result};
use pantry_core::Step;
use pantry_reasoning::ReActAgent;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_QUESTIONS: [&str; 4] = [
    "How do I make a chocolate cake?",
    "What is a good workout for a beginner?",
    "How much time does it take to cook apple pie?",
    "Can you find a recipe with chicken and rice?",
];

pub const DEFAULT_OUT_DIR: &str = "results/logs";

/// One report entry per question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvalRecord {
    Success {
        question: String,
        final_answer: Option<String>,
        steps_taken: usize,
        trajectory: Vec<Step>,
    },
    Failed {
        question: String,
        error: String,
    },
}

/// One question per line; blank lines and `#` comments are skipped.
pub fn load_questions<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read questions file: {}", path.as_ref().display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Run every question through a fresh agent run. A failed question is
/// recorded and the batch carries on.
pub async fn evaluate(agent: &ReActAgent, questions: &[String]) -> Vec<EvalRecord> {
    let mut records = Vec::with_capacity(questions.len());
    for (i, question) in questions.iter().enumerate() {
        tracing::info!("[{}/{}] Processing: {}", i + 1, questions.len(), question);
        let record = match agent.run(question).await {
            Ok(result) => EvalRecord::Success {
                question: question.clone(),
                final_answer: result.final_answer,
                steps_taken: result.steps.len(),
                trajectory: result.steps,
            },
            Err(e) => {
                tracing::error!("Error processing question: {:#}", e);
                EvalRecord::Failed {
                    question: question.clone(),
                    error: format!("{e:#}"),
                }
            }
        };
        records.push(record);
    }
    records
}

/// Write `records` to `out_dir/evaluation_<timestamp>.json`, creating the
/// directory if needed.
pub fn write_report(records: &[EvalRecord], out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;
    let file_name = chrono::Local::now()
        .format("evaluation_%Y%m%d_%H%M%S.json")
        .to_string();
    let path = out_dir.join(file_name);
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::{AgentConfig, Document};
    use pantry_reasoning::providers::ScriptedProvider;
    use pantry_reasoning::{LlmClient, ToolRegistry};
    use pantry_retrieval::RetrievalIndex;
    use std::sync::Arc;

    struct Unreachable;

    #[async_trait::async_trait]
    impl LlmClient for Unreachable {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("backend unreachable")
        }
    }

    fn agent(client: Arc<dyn LlmClient>) -> ReActAgent {
        let index = RetrievalIndex::build(vec![Document::new("recipe0", "Apple Pie", "apples flour")]);
        let registry = Arc::new(ToolRegistry::new(Arc::new(index)));
        ReActAgent::new(client, registry, AgentConfig::new(3, &["search"], false))
    }

    #[tokio::test]
    async fn test_success_records() {
        let client = Arc::new(ScriptedProvider::repeating(
            "Thought: easy\nAction: finish[answer=\"Apple Pie\"]",
        ));
        let questions = vec!["pie?".to_string(), "dessert?".to_string()];
        let records = evaluate(&agent(client), &questions).await;

        assert_eq!(records.len(), 2);
        let v = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["question"], "pie?");
        assert_eq!(v["final_answer"], "Apple Pie");
        assert_eq!(v["steps_taken"], 1);
        assert_eq!(v["trajectory"][0]["observation"], "done");
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let questions: Vec<String> = DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect();
        let records = evaluate(&agent(Arc::new(Unreachable)), &questions).await;

        assert_eq!(records.len(), 4);
        for record in &records {
            let v = serde_json::to_value(record).unwrap();
            assert_eq!(v["status"], "failed");
            assert!(v["error"].as_str().unwrap().contains("backend unreachable"));
            assert!(v.get("final_answer").is_none());
        }
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results").join("logs");
        let records = vec![EvalRecord::Failed {
            question: "q".into(),
            error: "boom".into(),
        }];
        let path = write_report(&records, &out).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("evaluation_") && name.ends_with(".json"));
        assert_eq!(name.len(), "evaluation_20240101_120000.json".len());
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["status"], "failed");
        assert_eq!(written[0]["error"], "boom");
    }

    #[test]
    fn test_load_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.txt");
        std::fs::write(&path, "# warm-up\nHow do I make soup?\n\n  Apple pie time?  \n").unwrap();
        assert_eq!(
            load_questions(&path).unwrap(),
            vec!["How do I make soup?", "Apple pie time?"]
        );
        assert!(load_questions(dir.path().join("missing.txt")).is_err());
    }
}
