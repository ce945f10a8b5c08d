//! parable: categorize notes into PARA buckets from the command line.
//!
//! Local categorization runs first; notes the local backend is unsure about
//! are escalated to the remote API, and every escalation is stored as a
//! training example in the SQLite database.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parable_core::defaults::{DATABASE_URL, ENV_DATABASE_URL, TRAINING_RECENT_LIMIT};
use parable_core::{
    Availability, CategorizationBackend, CategorizationSource, Category, TrainingExample,
    TrainingExampleRepository,
};
use parable_db::Database;
use parable_inference::{CategorizationOrchestrator, OrchestratorConfig};

#[derive(Parser)]
#[command(name = "parable")]
#[command(author, version, about = "Two-tier PARA note categorizer")]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite database holding captured training examples
    #[arg(long, global = true, env = ENV_DATABASE_URL, default_value = DATABASE_URL)]
    database_url: String,

    /// Config file (default: $PARABLE_CONFIG or ~/.config/parable/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Categorize a note and print the outcome as JSON
    Categorize {
        /// Note text
        text: String,
    },

    /// Show which categorization backends are usable
    Status,

    /// Inspect captured training examples
    Examples {
        #[command(subcommand)]
        command: ExamplesCommand,
    },
}

#[derive(Subcommand)]
enum ExamplesCommand {
    /// Most recent examples first
    Recent {
        /// Maximum number of examples
        #[arg(short, long, default_value_t = TRAINING_RECENT_LIMIT)]
        limit: i64,
    },

    /// Examples for one category
    Category {
        /// project, area, resource, archive, or uncategorized
        category: Category,
    },

    /// Number of stored examples
    Count,
}

#[derive(Serialize)]
struct CategorizeOutput<'a> {
    category: Category,
    reasoning: &'a str,
    confidence: f64,
    source: CategorizationSource,
    processing_ms: u64,
}

#[derive(Serialize)]
struct BackendStatus<'a> {
    name: &'a str,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl<'a> BackendStatus<'a> {
    fn of(backend: &'a dyn CategorizationBackend) -> Self {
        Self::new(backend.name(), backend.check_availability())
    }

    fn new(name: &'a str, availability: Availability) -> Self {
        Self {
            name,
            available: availability.is_available(),
            reason: availability.reason().map(|r| r.as_str()),
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    orchestrator: BackendStatus<'a>,
    local: BackendStatus<'a>,
    remote: BackendStatus<'a>,
    confidence_threshold: f64,
    store_training_examples: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing on stderr, keeping stdout for command output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   RUST_LOG    - standard env filter (default: "parable=info")
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "parable=info,parable_inference=info,parable_db=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<OrchestratorConfig> {
    let config = match path {
        Some(path) => OrchestratorConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => OrchestratorConfig::load().context("loading config")?,
    };
    Ok(config)
}

async fn open_database(url: &str) -> anyhow::Result<Database> {
    Database::connect(url)
        .await
        .with_context(|| format!("opening database {}", url))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Categorize { text } => {
            let config = load_config(cli.config.as_ref())?;
            let db = open_database(&cli.database_url).await?;
            cmd_categorize(config, db, &text).await
        }
        Commands::Status => {
            let config = load_config(cli.config.as_ref())?;
            cmd_status(config).await
        }
        Commands::Examples { command } => {
            let db = open_database(&cli.database_url).await?;
            cmd_examples(&db.training, command).await
        }
    }
}

async fn cmd_categorize(config: OrchestratorConfig, db: Database, text: &str) -> anyhow::Result<()> {
    let training: Arc<dyn TrainingExampleRepository> = Arc::new(db.training.clone());
    let orchestrator = CategorizationOrchestrator::from_config(config, Some(training)).await?;

    let outcome = orchestrator.categorize_with_fallback(text).await?;
    info!(
        category = %outcome.category(),
        source = %outcome.source,
        "Categorization finished"
    );

    print_json(&CategorizeOutput {
        category: outcome.result.category,
        reasoning: &outcome.result.reasoning,
        confidence: outcome.result.confidence,
        source: outcome.source,
        processing_ms: outcome.processing_time.as_millis() as u64,
    })
}

async fn cmd_status(config: OrchestratorConfig) -> anyhow::Result<()> {
    let orchestrator = CategorizationOrchestrator::from_config(config, None).await?;

    print_json(&StatusOutput {
        orchestrator: BackendStatus::new("orchestrator", orchestrator.check_availability()),
        local: BackendStatus::of(orchestrator.local().as_ref()),
        remote: BackendStatus::of(orchestrator.remote().as_ref()),
        confidence_threshold: orchestrator.confidence_threshold(),
        store_training_examples: orchestrator.config().store_training_examples,
    })
}

async fn cmd_examples(
    repo: &dyn TrainingExampleRepository,
    command: ExamplesCommand,
) -> anyhow::Result<()> {
    match command {
        ExamplesCommand::Recent { limit } => print_examples(&repo.fetch_recent(limit).await?),
        ExamplesCommand::Category { category } => {
            print_examples(&repo.fetch_by_category(category).await?)
        }
        ExamplesCommand::Count => {
            println!("{}", repo.count().await?);
            Ok(())
        }
    }
}

fn print_examples(examples: &[TrainingExample]) -> anyhow::Result<()> {
    print_json(&examples)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
