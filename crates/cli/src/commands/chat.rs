//! Chat command handler.
//!
//! Interactive REPL over the knowledge base. Lines starting with `/` are
//! session commands; anything else is a question.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::RagEngine;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

const HELP: &str = "\
Commands:
  /help     - Show this help message
  /update   - Add content to the knowledge base
  /status   - Show knowledge base and session status
  /clear    - Clear chat history
  /quit     - Exit the chat

Type a question to get an answer from the knowledge base.";

/// Terminates multi-line `/update` input.
const END_MARKER: &str = "END";

/// Interactive question-and-answer session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of chunks to retrieve per question
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Answer with the local heuristic only, never calling a model
    #[arg(long)]
    pub offline: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let mut config = config.clone();
        if self.offline {
            config.generation.provider = "none".to_string();
        }
        if let Some(top_k) = self.top_k {
            config.knowledge.top_k = top_k;
        }

        let engine = RagEngine::from_config(&config).await?;
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();

        run_session(&engine, stdin, &mut stdout).await
    }
}

/// Session command parsed from a line starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Help,
    Update,
    Status,
    Clear,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Option<Self> {
        if !line.starts_with('/') {
            return None;
        }

        Some(match line.to_lowercase().as_str() {
            "/help" => Self::Help,
            "/update" => Self::Update,
            "/status" => Self::Status,
            "/clear" => Self::Clear,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        })
    }
}

/// One question and its answer.
#[derive(Debug, Clone)]
struct Turn {
    question: String,
    sources: usize,
}

/// Run the REPL until `/quit` or end of input.
pub async fn run_session<R, W>(engine: &RagEngine, input: R, out: &mut W) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut history: Vec<Turn> = Vec::new();

    writeln!(out, "Welcome to Grounded chat!")?;
    writeln!(out, "Type /help for available commands, /quit to exit.")?;

    loop {
        write!(out, "\nYou: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out, "\nGoodbye!")?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match ReplCommand::parse(line) {
            Some(ReplCommand::Help) => writeln!(out, "{}", HELP)?,
            Some(ReplCommand::Update) => update_knowledge(engine, &mut lines, out).await?,
            Some(ReplCommand::Status) => {
                let stats = engine.store().stats();
                writeln!(out, "Status:")?;
                writeln!(out, "  Knowledge: v{} ({:?})", stats.version, stats.state)?;
                writeln!(out, "  Chunks: {}", stats.chunk_count)?;
                writeln!(
                    out,
                    "  Embeddings: {} ({}, {} dims)",
                    stats.embedding_provider, stats.embedding_model, stats.dimensions
                )?;
                writeln!(out, "  Generator: {}", engine.generator().name())?;
                writeln!(
                    out,
                    "  Session: {} questions, {} sources cited",
                    history.len(),
                    history.iter().map(|t| t.sources).sum::<usize>()
                )?;
                if let Some(last) = history.last() {
                    writeln!(out, "  Last question: {}", last.question)?;
                }
            }
            Some(ReplCommand::Clear) => {
                history.clear();
                writeln!(out, "Chat history cleared")?;
            }
            Some(ReplCommand::Quit) => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            Some(ReplCommand::Unknown(command)) => {
                writeln!(out, "Unknown command: {}", command)?;
                writeln!(out, "Type /help for available commands")?;
            }
            None => match engine.ask(line).await {
                Ok(response) => {
                    writeln!(out, "\nAssistant: {}", response.answer)?;
                    history.push(Turn {
                        question: line.to_string(),
                        sources: response.sources.len(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Question failed: {}", e);
                    writeln!(out, "Error: {}", e)?;
                }
            },
        }
    }

    Ok(())
}

/// Read lines up to the end marker and append them to the knowledge base.
async fn update_knowledge<R, W>(
    engine: &RagEngine,
    lines: &mut Lines<R>,
    out: &mut W,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "Enter new content (type '{}' on a new line to finish):",
        END_MARKER
    )?;
    out.flush()?;

    let mut content = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == END_MARKER {
            break;
        }
        content.push(line);
    }

    let text = content.join("\n");
    if text.trim().is_empty() {
        writeln!(out, "No content provided")?;
        return Ok(());
    }

    match engine.update_knowledge(&text).await {
        Ok(stats) => writeln!(
            out,
            "Knowledge base updated (v{}, {} chunks)",
            stats.version, stats.chunk_count
        )?,
        Err(e) => {
            tracing::warn!("Knowledge update failed: {}", e);
            writeln!(out, "Failed to update knowledge base: {}", e)?;
        }
    }

    Ok(())
}
