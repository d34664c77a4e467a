mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use memory_core::embeddings::circuit_breaker::CircuitBreakerClient;
use memory_core::embeddings::http::HttpEmbeddingClient;
use memory_core::embeddings::EmbeddingClient;
use memory_core::store::Store;
use memory_store::LibsqlStore;
use output::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "memory-cli")]
#[command(about = "Operator CLI for the Hebbian memory engine")]
#[command(version)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and run schema migrations.
    Init,
    /// Run a retrieval and print the selected memories.
    Query(commands::query::QueryArgs),
    /// Print the top memories by activation.
    Top(commands::top::TopArgs),
    /// Print store-wide counts and the activation distribution.
    Stats,
    /// Multiply every memory's activation by a decay factor.
    Decay(commands::decay::DecayArgs),
    /// List memories below an activation threshold.
    LowActivation(commands::low_activation::LowActivationArgs),
    /// Mark a memory deprecated in favour of its replacement.
    Deprecate(commands::deprecate::DeprecateArgs),
    /// Record that one memory corrects another.
    Correct(commands::correct::CorrectArgs),
    /// Embed any active memory that is missing one.
    BackfillEmbeddings(commands::backfill::BackfillArgs),
    /// Ingest a newline-delimited JSON file of candidate entries.
    Ingest(commands::ingest::IngestArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let engine_config = config::load_config(cli.config.as_deref())?;

    let store = LibsqlStore::open(&engine_config.db_path).await?;
    store.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(store);

    let embeddings: Arc<dyn EmbeddingClient> = Arc::new(CircuitBreakerClient::new(
        HttpEmbeddingClient::new(
            engine_config.embed_url.as_str(),
            engine_config.embed_model.as_str(),
            engine_config.dimension,
        )?,
        5,
        Duration::from_secs(30),
    ));

    match cli.command {
        Commands::Init => {
            println!("initialized db_path={}", engine_config.db_path);
            Ok(())
        }
        Commands::Query(args) => commands::query::run(args, &store, &embeddings, &engine_config, cli.format).await,
        Commands::Top(args) => commands::top::run(args, &store, cli.format).await,
        Commands::Stats => commands::stats::run(&store, cli.format).await,
        Commands::Decay(args) => commands::decay::run(args, &store, &engine_config, cli.format).await,
        Commands::LowActivation(args) => commands::low_activation::run(args, &store, cli.format).await,
        Commands::Deprecate(args) => commands::deprecate::run(args, &store, cli.format).await,
        Commands::Correct(args) => commands::correct::run(args, &store, cli.format).await,
        Commands::BackfillEmbeddings(args) => {
            commands::backfill::run(args, &store, &embeddings, cli.format).await
        }
        Commands::Ingest(args) => commands::ingest::run(args, &store, &embeddings, cli.format).await,
    }
}
