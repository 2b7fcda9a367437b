//! RAG response types.

use crate::retriever::RetrievedChunk;
use serde::{Deserialize, Serialize};

/// Maximum snippet length, in characters, for source references.
pub const MAX_SNIPPET_CHARS: usize = 150;

/// A chunk of the knowledge base that was used to answer a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Chunk position in the snapshot
    pub chunk_id: usize,

    /// Human-readable location in the knowledge file, e.g. "bytes 0-17"
    pub location: String,

    /// Similarity of the chunk to the query
    pub score: f32,

    /// Short snippet of the chunk text (truncated if needed)
    pub snippet: String,
}

impl From<&RetrievedChunk> for RagSourceRef {
    fn from(retrieved: &RetrievedChunk) -> Self {
        let range = &retrieved.chunk.source_offset;
        Self {
            chunk_id: retrieved.chunk.id,
            location: format!("bytes {}-{}", range.start, range.end),
            score: retrieved.score,
            snippet: truncate_snippet(&retrieved.chunk.text, MAX_SNIPPET_CHARS),
        }
    }
}

/// Answer to a question, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Answer text; never empty
    pub answer: String,

    /// Chunks the answer was grounded on, best first
    pub sources: Vec<RagSourceRef>,

    /// Highest similarity score among the sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_score: Option<f32>,

    /// Snapshot the sources came from
    pub snapshot_version: u64,

    /// Whether the local heuristic produced the answer
    pub used_fallback: bool,

    /// Generator that produced the answer
    pub generator: String,
}

impl RagResponse {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Truncate `text` to at most `max_chars` characters at a word boundary.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }

    let cut = flat
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(flat.len());
    let truncated = &flat[..cut];

    match truncated.rfind(' ') {
        Some(space) if space > 0 => format!("{}...", &truncated[..space]),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;

    #[test]
    fn test_source_ref_from_retrieved_chunk() {
        let retrieved = RetrievedChunk {
            chunk: Chunk {
                id: 1,
                text: "Dogs are mammals too.".to_string(),
                source_offset: 19..40,
            },
            score: 0.91,
        };

        let source = RagSourceRef::from(&retrieved);
        assert_eq!(source.chunk_id, 1);
        assert_eq!(source.location, "bytes 19-40");
        assert_eq!(source.snippet, "Dogs are mammals too.");
        assert_eq!(source.score, 0.91);
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("Short text", 100), "Short text");

        let long = "This is a very long text that needs to be truncated at some point";
        let result = truncate_snippet(long, 30);
        assert_eq!(result, "This is a very long text that...");
    }

    #[test]
    fn test_truncate_snippet_multibyte() {
        let text = "é".repeat(200);
        let result = truncate_snippet(&text, 10);
        assert_eq!(result, format!("{}...", "é".repeat(10)));
    }

    #[test]
    fn test_truncate_snippet_flattens_newlines() {
        assert_eq!(truncate_snippet("line one\nline two", 100), "line one line two");
    }

    #[test]
    fn test_response_serialization() {
        let response = RagResponse {
            answer: "Yes.".to_string(),
            sources: Vec::new(),
            top_score: None,
            snapshot_version: 4,
            used_fallback: true,
            generator: "heuristic".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["snapshot_version"], 4);
        assert_eq!(json["used_fallback"], true);
        assert!(json.get("top_score").is_none());
        assert!(!response.has_sources());
    }
}
