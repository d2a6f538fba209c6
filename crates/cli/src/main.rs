//! Booksum CLI
//!
//! Main entry point for the booksum command-line tool.
//! Summarizes long plain-text documents with local or hosted models and
//! keeps a history of completed runs.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ExportCommand, HistoryCommand, SummarizeCommand};
use booksum_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Booksum CLI - long-document summarization with local-first models
#[derive(Parser, Debug)]
#[command(name = "booksum")]
#[command(about = "Summarize long documents with local or hosted models", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "BOOKSUM_CONFIG")]
    config: Option<PathBuf>,

    /// Summarization provider (instruct, pipeline, gemini)
    #[arg(short, long, global = true, env = "BOOKSUM_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "BOOKSUM_MODEL")]
    model: Option<String>,

    /// API key for hosted providers
    #[arg(long, global = true, env = "BOOKSUM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output language (es, en)
    #[arg(short, long, global = true, env = "BOOKSUM_LANGUAGE")]
    language: Option<String>,

    /// Path to the history database
    #[arg(long, global = true, env = "BOOKSUM_DB")]
    db: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output (`NO_COLOR` is also honored)
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a plain-text file (or stdin)
    Summarize(SummarizeCommand),

    /// Browse and manage the summary history
    History(HistoryCommand),

    /// Export the summary history to CSV
    Export(ExportCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let mut config = config.with_overrides(
        cli.config,
        cli.provider,
        cli.model,
        cli.language,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    )?;
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);
    tracing::debug!("Language: {}", config.language);

    let command_name = match &cli.command {
        Commands::Summarize(_) => "summarize",
        Commands::History(_) => "history",
        Commands::Export(_) => "export",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Summarize(cmd) => cmd.execute(&config).await,
        Commands::History(cmd) => cmd.execute(&config).await,
        Commands::Export(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
