//! Knowledge command handler.
//!
//! Inspects and updates the knowledge file behind the RAG engine.

use super::read_input_file;
use clap::{Args, Subcommand};
use grounded_core::{config::AppConfig, AppError, AppResult};
use grounded_knowledge::KnowledgeStore;
use std::path::PathBuf;

/// Inspect and update the knowledge base
#[derive(Args, Debug)]
pub struct KnowledgeCommand {
    #[command(subcommand)]
    pub action: KnowledgeAction,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeAction {
    /// Append text to the knowledge file and rebuild
    Append(KnowledgeAppendCommand),
    /// Show knowledge base statistics
    Stats(KnowledgeStatsCommand),
    /// Retrieve the chunks most similar to a query
    Search(KnowledgeSearchCommand),
    /// List the chunks of the knowledge base
    Chunks(KnowledgeChunksCommand),
}

/// Append text to the knowledge file
#[derive(Args, Debug)]
pub struct KnowledgeAppendCommand {
    /// Text to append
    pub text: Option<String>,

    /// Read the text to append from a file
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeAppendCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge append command");

        let text = match (&self.text, &self.file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => read_input_file(path).await?,
            (None, None) => {
                return Err(AppError::InvalidArgument(
                    "No content provided".to_string(),
                ))
            }
        };

        let store = KnowledgeStore::from_config(config).await?;
        store.append(&text).await?;
        let stats = store.stats();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Knowledge base updated: v{} with {} chunks ({} bytes)",
                stats.version, stats.chunk_count, stats.source_bytes
            );
        }

        Ok(())
    }
}

/// Show knowledge base stats
#[derive(Args, Debug)]
pub struct KnowledgeStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge stats command");

        let store = KnowledgeStore::from_config(config).await?;
        let stats = store.stats();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            if let Some(path) = &stats.path {
                println!("Knowledge file: {}", path.display());
            }
            println!("  Version: {}", stats.version);
            println!("  Chunks: {}", stats.chunk_count);
            println!("  Source: {} bytes (sha256 {})", stats.source_bytes, stats.source_sha256);
            println!(
                "  Embeddings: {} / {} ({} dims)",
                stats.embedding_provider, stats.embedding_model, stats.dimensions
            );
            println!("  Built at: {}", stats.built_at.to_rfc3339());
        }

        Ok(())
    }
}

/// Retrieve chunks for a query
#[derive(Args, Debug)]
pub struct KnowledgeSearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to retrieve (default: configured topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeSearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge search command");

        let store = KnowledgeStore::from_config(config).await?;
        let top_k = self.top_k.unwrap_or(config.knowledge.top_k);
        let result = store.retrieve(&self.query, top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else if result.is_empty() {
            println!("No matching chunks");
        } else {
            for (rank, hit) in result.chunks.iter().enumerate() {
                println!(
                    "{}. chunk {} (score {:.3}, bytes {}-{})",
                    rank + 1,
                    hit.chunk.id,
                    hit.score,
                    hit.chunk.source_offset.start,
                    hit.chunk.source_offset.end
                );
                println!("   {}", hit.chunk.text.trim());
            }
        }

        Ok(())
    }
}

/// List chunks
#[derive(Args, Debug)]
pub struct KnowledgeChunksCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeChunksCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge chunks command");

        let store = KnowledgeStore::from_config(config).await?;
        let snapshot = store.snapshot();

        if self.json {
            println!("{}", serde_json::to_string_pretty(snapshot.chunks())?);
        } else {
            for chunk in snapshot.chunks() {
                println!(
                    "[{}] bytes {}-{} ({} chars)",
                    chunk.id,
                    chunk.source_offset.start,
                    chunk.source_offset.end,
                    chunk.text.chars().count()
                );
                println!("{}", chunk.text);
                println!();
            }
        }

        Ok(())
    }
}

impl KnowledgeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KnowledgeAction::Append(cmd) => cmd.execute(config).await,
            KnowledgeAction::Stats(cmd) => cmd.execute(config).await,
            KnowledgeAction::Search(cmd) => cmd.execute(config).await,
            KnowledgeAction::Chunks(cmd) => cmd.execute(config).await,
        }
    }
}
