//! Ask command handler.
//!
//! Answers one question from the knowledge file and prints the sources used.

use super::read_input_file;
use clap::Args;
use grounded_core::{config::AppConfig, AppError, AppResult};
use grounded_knowledge::{RagEngine, RagResponse};
use std::path::PathBuf;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Answer with the local heuristic only, never calling a model
    #[arg(long)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question().await?;

        let mut config = config.clone();
        if self.offline {
            config.generation.provider = "none".to_string();
        }
        if let Some(top_k) = self.top_k {
            config.knowledge.top_k = top_k;
        }

        let engine = RagEngine::from_config(&config).await?;
        let response = engine.ask(&question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print_response(&response);
        }

        Ok(())
    }

    async fn question(&self) -> AppResult<String> {
        let question = match (&self.question, &self.file) {
            (Some(question), _) => question.clone(),
            (None, Some(path)) => read_input_file(path).await?,
            (None, None) => {
                return Err(AppError::InvalidArgument(
                    "No question provided".to_string(),
                ))
            }
        };

        Ok(question.trim().to_string())
    }
}

/// Human-readable answer with its sources.
fn print_response(response: &RagResponse) {
    println!("Answer:");
    println!("{}", response.answer);
    println!();

    if !response.has_sources() {
        println!("Sources: (no sources available)");
        return;
    }

    println!("Sources:");
    for source in &response.sources {
        println!(
            "- chunk {} ({}, score {:.3}): {}",
            source.chunk_id, source.location, source.score, source.snippet
        );
    }

    if response.used_fallback {
        tracing::debug!("Answer produced by the heuristic fallback");
    }
}
