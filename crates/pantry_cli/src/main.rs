use anyhow::Result;
use clap::{Parser, Subcommand};
use pantry_core::{PantryConfig, RunResult};
use pantry_reasoning::providers::create_client;
use pantry_reasoning::{ReActAgent, ToolKind, ToolRegistry};
use pantry_retrieval::{load_corpus, RetrievalIndex};
use serde_json::{json, Map, Value};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod eval;
mod finder;

#[derive(Parser, Debug)]
#[command(name = "pantry", author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file (defaults are used if it is missing)
    #[arg(short, long, env = "PANTRY_CONFIG", default_value = "pantry.toml")]
    config: PathBuf,

    /// Debug-level logging and per-step output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one question with the agent
    Ask {
        question: String,
        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query the index directly, without a model
    Search {
        query: String,
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Ask questions interactively until `quit`
    Repl,
    /// Run a batch of questions and save a JSON report
    Eval {
        /// File with one question per line (built-in questions if omitted)
        #[arg(long)]
        questions: Option<PathBuf>,
        #[arg(long, default_value = eval::DEFAULT_OUT_DIR)]
        out: PathBuf,
    },
    /// Find recipes for a set of ingredients
    Find {
        /// Comma-separated ingredients, e.g. "chicken, rice"
        #[arg(long)]
        ingredients: String,
        /// Upper bound on cooking time; 0 means no limit
        #[arg(long, default_value_t = 0)]
        max_minutes: u32,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_registry(config: &PantryConfig) -> Result<Arc<ToolRegistry>> {
    info!("Loading corpus from {}...", config.corpus.path.display());
    let documents = load_corpus(&config.corpus.path, &config.corpus.id_prefix)?;
    let index = RetrievalIndex::build(documents).with_snippet_chars(config.search.snippet_chars);
    let registry = ToolRegistry::new(Arc::new(index)).with_default_k(config.search.default_k);
    Ok(Arc::new(registry))
}

fn build_agent(config: &PantryConfig, registry: Arc<ToolRegistry>) -> Result<ReActAgent> {
    config.agent.validate(&registry.names())?;
    info!(
        "Using {} model {} (max {} steps)",
        config.llm.provider, config.llm.model, config.agent.max_steps
    );
    let client = create_client(&config.llm)?;
    Ok(ReActAgent::new(client, registry, config.agent.clone()))
}

fn print_run(result: &RunResult) {
    for (i, step) in result.steps.iter().enumerate() {
        println!("Step {}:", i + 1);
        println!("  Thought: {}", step.thought);
        println!("  {}", step.action);
        println!("  Observation: {}", step.observation);
    }
    println!();
    println!("Status: {}", result.state.label());
    println!(
        "Answer: {}",
        result.final_answer.as_deref().unwrap_or("(no answer)")
    );
}

async fn repl(agent: &ReActAgent) -> Result<()> {
    println!("Pantry ready. Type 'quit' to exit.");
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let trimmed = input.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        match agent.run(trimmed).await {
            Ok(result) => {
                if agent.config().verbose {
                    print_run(&result);
                } else {
                    println!(
                        "{}",
                        result.final_answer.as_deref().unwrap_or("(no answer)")
                    );
                }
            }
            Err(e) => {
                tracing::error!("Run failed: {:#}", e);
                println!("[Error]: {e:#}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = PantryConfig::load_or_default(&cli.config);
    if cli.verbose {
        config.agent.verbose = true;
    }
    let registry = build_registry(&config)?;

    match cli.command {
        Command::Ask { question, json } => {
            let agent = build_agent(&config, registry)?;
            let result = agent.run(&question).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_run(&result);
            }
        }
        Command::Search { query, k } => {
            let mut args = Map::new();
            args.insert("query".to_string(), Value::String(query));
            if let Some(k) = k {
                args.insert("k".to_string(), json!(k));
            }
            let output = registry.invoke(ToolKind::Search, &args)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Repl => {
            let agent = build_agent(&config, registry)?;
            repl(&agent).await?;
        }
        Command::Eval { questions, out } => {
            let agent = build_agent(&config, registry)?;
            let questions = match questions {
                Some(path) => eval::load_questions(path)?,
                None => eval::DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            };
            let records = eval::evaluate(&agent, &questions).await;
            let path = eval::write_report(&records, &out)?;
            println!("Evaluation complete. Results saved to: {}", path.display());
        }
        Command::Find {
            ingredients,
            max_minutes,
        } => {
            let agent = build_agent(&config, registry.clone())?;
            let question = finder::compose_question(&ingredients, max_minutes);
            println!("{question}");
            let result = agent.run(&question).await?;
            let answer = result
                .final_answer
                .unwrap_or_else(|| "I couldn't find a specific answer.".to_string());
            println!("\n{answer}\n");

            let matches = finder::match_documents(&answer, registry.index().documents());
            if matches.is_empty() {
                println!("No matching recipe found in the corpus for this answer.");
            }
            for doc in matches {
                println!("== {} ==", doc.title);
                println!("Total time: {}", doc.total_time_or_unknown());
                println!("Ingredients: {}", finder::ingredients(doc));
                if let Some(url) = doc.url.as_deref().filter(|u| !u.is_empty()) {
                    println!("Source: {url}");
                }
                println!();
            }
        }
    }

    Ok(())
}
