//! Command handlers for the Grounded CLI.

pub mod ask;
pub mod chat;
pub mod knowledge;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use knowledge::KnowledgeCommand;

use grounded_core::AppResult;
use std::path::Path;

/// Read a UTF-8 input file given on the command line.
pub(crate) async fn read_input_file(path: &Path) -> AppResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        grounded_core::AppError::InvalidArgument(format!(
            "Cannot read input file {}: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grounded_core::AppError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_input_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("question.txt");
        std::fs::write(&path, "Are dogs mammals?\n").unwrap();

        assert_eq!(read_input_file(&path).await.unwrap(), "Are dogs mammals?\n");
    }

    #[tokio::test]
    async fn test_read_missing_input_file() {
        let temp = TempDir::new().unwrap();
        let result = read_input_file(&temp.path().join("missing.txt")).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }
}
