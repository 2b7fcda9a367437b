//! Grounded CLI
//!
//! Main entry point for the grounded command-line tool.
//! Answers questions from a local knowledge file with retrieval-augmented generation.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, KnowledgeCommand};
use grounded_core::config::{AppConfig, CliOverrides};
use grounded_core::logging::{self, LogFormat};
use std::path::PathBuf;

/// Grounded - answers grounded in your own knowledge file
#[derive(Parser, Debug)]
#[command(name = "grounded")]
#[command(about = "Question answering grounded in a local knowledge file", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "GROUNDED_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "GROUNDED_CONFIG")]
    config: Option<PathBuf>,

    /// Knowledge file (default: knowledge.txt in the workspace)
    #[arg(short = 'f', long, global = true, env = "GROUNDED_KNOWLEDGE_FILE")]
    knowledge_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, openai, huggingface, none)
    #[arg(short, long, global = true, env = "GROUNDED_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "GROUNDED_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive question-and-answer session
    Chat(ChatCommand),

    /// Inspect and update the knowledge base
    Knowledge(KnowledgeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()
        .context("Failed to load configuration")?
        .with_overrides(CliOverrides {
            workspace: cli.workspace,
            config_file: cli.config,
            knowledge_file: cli.knowledge_file,
            provider: cli.provider,
            model: cli.model,
            top_k: None,
            log_level: cli.log_level,
            verbose: cli.verbose,
            no_color: cli.no_color,
        });

    let format = if config.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, format)?;

    config.validate()?;

    tracing::info!("Grounded CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Knowledge file: {:?}", config.knowledge_path());
    tracing::debug!(
        "Generation: {} ({})",
        config.generation.provider,
        config.generation.model
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Knowledge(_) => "knowledge",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Knowledge(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("grounded {} failed", command_name))
}
