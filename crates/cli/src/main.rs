//! Agora CLI
//!
//! Main entry point for the agora command-line tool.
//! Answers questions about a document corpus through a multi-agent debate.

mod commands;
mod context;

use agora_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{AskCommand, IndexCommand, SearchCommand, StatusCommand};
use context::AppContext;
use std::path::PathBuf;

/// Agora - retrieval-grounded multi-agent debate over your documents
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(about = "Retrieval-grounded multi-agent debate over your documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "AGORA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Directory of .txt documents to index
    #[arg(long, global = true, env = "AGORA_CORPUS_DIR")]
    corpus_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question and run the debate
    Ask(AskCommand),

    /// Show the passages retrieved for a query
    Search(SearchCommand),

    /// Build or refresh the index
    Index(IndexCommand),

    /// Show index status
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load from the chosen workspace so its .agora/config.yaml is honoured
    let config = AppConfig::load_for(cli.workspace.clone())?.with_overrides(
        cli.workspace,
        cli.corpus_dir,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Agora CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Corpus: {:?}", config.corpus_dir());

    config.validate()?;
    config.ensure_agora_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Index(_) => "index",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // `index` manages the rebuild itself; everything else needs a warm index
    let warm_up = !matches!(cli.command, Commands::Index(_));
    let ctx = AppContext::initialize(config, warm_up).await?;

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&ctx).await,
        Commands::Search(cmd) => cmd.execute(&ctx).await,
        Commands::Index(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
