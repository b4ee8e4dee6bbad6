//! Rivulet demo runner
//!
//! Usage:
//!   rivulet-demo todo "buy milk"
//!   rivulet-demo list "buy milk" "walk dog"
//!   rivulet-demo parallel
//!   rivulet-demo run flow.json --input '{"input": {"text": "x"}}' --expect processingResult

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rivulet_core::{FlowDefinition, FlowManager, FlowManagerConfig, ValueMap};
use rivulet_monitoring::{init_logging, LogExt, MonitoringConfig};
use rivulet_state_inmemory::InMemoryStateStoreProvider;
use rivulet_stdlib::{parallel_processing_flow, Submission, TodoService};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

// CLI Arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and store a todo, then run the fan-in flow
    Todo {
        /// Todo text
        text: String,
    },

    /// Submit the given todos, then list everything stored
    List {
        /// Todo texts to submit first
        texts: Vec<String>,
    },

    /// Run the fan-in example flow
    Parallel,

    /// Run a flow definition read from a JSON file
    Run {
        /// Path to the flow definition
        flow: PathBuf,

        /// Initial values as a JSON object
        #[arg(long, default_value = "{}")]
        input: String,

        /// Result names to return; all declared results when omitted
        #[arg(long = "expect")]
        expected: Vec<String>,
    },
}

/// Report for an accepted todo; a rejection becomes the command's error
fn accepted_report(submission: Submission) -> Result<Value> {
    match submission {
        Submission::Rejected { error } => bail!("Todo rejected: {error}"),
        accepted => Ok(accepted.to_value()?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&MonitoringConfig::from_env("rivulet-demo"))
        .context("Failed to initialize logging")?;

    let manager = FlowManager::new(FlowManagerConfig::load());
    info!(config = ?manager.config(), "Flow manager configured");

    let store = InMemoryStateStoreProvider::new();
    let service = TodoService::new(manager.clone(), store.todo_repository())
        .context("Failed to build todo service")?;
    let resolvers = service.resolvers();

    let result = match cli.command {
        Commands::Todo { text } => {
            let submission = service
                .submit(&text)
                .await
                .log_err("Todo submission failed")?;
            let report = accepted_report(submission)?;
            info!(stored = store.todo_count().await, "Todo flow finished");
            report
        }
        Commands::List { texts } => {
            for text in &texts {
                if let Submission::Rejected { error } = service.submit(text).await? {
                    bail!("Todo '{text}' rejected: {error}");
                }
            }
            serde_json::to_value(service.list().await?)?
        }
        Commands::Parallel => {
            let result = manager
                .run(&parallel_processing_flow(), ValueMap::new(), ["parallelResult"], resolvers)
                .await
                .log_err("Parallel flow failed")?;
            serde_json::to_value(result)?
        }
        Commands::Run {
            flow,
            input,
            expected,
        } => {
            let definition = std::fs::read_to_string(&flow)
                .with_context(|| format!("Failed to read {}", flow.display()))?;
            let definition: Value = serde_json::from_str(&definition)
                .with_context(|| format!("{} is not valid JSON", flow.display()))?;
            let definition = FlowDefinition::from_json(definition)
                .context("Invalid flow definition")?;
            let initial: ValueMap =
                serde_json::from_str(&input).context("--input must be a JSON object")?;

            let result = manager
                .run(&definition, initial, expected, resolvers)
                .await
                .log_err("Flow failed")?;
            serde_json::to_value(result)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
