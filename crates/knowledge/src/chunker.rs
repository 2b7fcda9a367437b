//! Paragraph chunking with word-window splitting for oversized paragraphs.
//!
//! The knowledge source is split on blank lines into paragraphs. Short
//! paragraphs become one chunk verbatim; long ones are re-assembled into
//! overlapping word windows.
//!
//! The two paths measure size in different units, and both are kept as
//! separately named parameters:
//! - `max_chars_verbatim` is a **character** count deciding whether a
//!   paragraph is kept whole.
//! - `window_words` / `window_overlap_words` are **word** counts used only
//!   when a paragraph is split.

use grounded_core::config::KnowledgeSettings;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A bounded unit of source text; the atomic retrieval item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based position in the current chunk sequence
    pub id: usize,

    /// Chunk text (never empty)
    pub text: String,

    /// Byte range in the knowledge source this chunk was taken from.
    ///
    /// For verbatim chunks `&source[source_offset] == text`. Windowed chunks
    /// join their words with single spaces, so the range covers the original
    /// span from the first word to the last.
    pub source_offset: Range<usize>,
}

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Paragraphs with at most this many characters are kept whole
    pub max_chars_verbatim: usize,

    /// Words per window when splitting a long paragraph
    pub window_words: usize,

    /// Words shared by consecutive windows
    pub window_overlap_words: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars_verbatim: 512,
            window_words: 512,
            window_overlap_words: 50,
        }
    }
}

impl From<&KnowledgeSettings> for ChunkConfig {
    fn from(settings: &KnowledgeSettings) -> Self {
        Self {
            max_chars_verbatim: settings.max_chars_verbatim,
            window_words: settings.window_words,
            window_overlap_words: settings.window_overlap_words,
        }
    }
}

/// Stateless paragraph chunker with validated parameters.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker, rejecting windows that would never advance.
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        if config.window_words == 0 {
            return Err(AppError::Config(
                "windowWords must be greater than 0".to_string(),
            ));
        }

        if config.window_overlap_words >= config.window_words {
            return Err(AppError::Config(format!(
                "windowOverlapWords ({}) must be less than windowWords ({})",
                config.window_overlap_words, config.window_words
            )));
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split `text` into chunks in source order.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for paragraph in paragraphs(text) {
            let body = &text[paragraph.clone()];

            if body.chars().count() <= self.config.max_chars_verbatim {
                chunks.push(Chunk {
                    id: chunks.len(),
                    text: body.to_string(),
                    source_offset: paragraph,
                });
            } else {
                self.split_windows(text, paragraph, &mut chunks);
            }
        }

        tracing::debug!(
            "Chunked {} bytes into {} chunks (verbatim <= {} chars, window {} words, overlap {})",
            text.len(),
            chunks.len(),
            self.config.max_chars_verbatim,
            self.config.window_words,
            self.config.window_overlap_words
        );

        chunks
    }

    /// Emit overlapping word windows for one oversized paragraph.
    fn split_windows(&self, text: &str, paragraph: Range<usize>, chunks: &mut Vec<Chunk>) {
        let base = paragraph.start;
        let words = word_spans(&text[paragraph]);
        let step = self.config.window_words - self.config.window_overlap_words;

        for begin in (0..words.len()).step_by(step) {
            let end = (begin + self.config.window_words).min(words.len());
            let window = &words[begin..end];

            let (Some(first), Some(last)) = (window.first(), window.last()) else {
                continue;
            };

            let joined = window
                .iter()
                .map(|w| &text[base + w.start..base + w.end])
                .collect::<Vec<_>>()
                .join(" ");

            chunks.push(Chunk {
                id: chunks.len(),
                text: joined,
                source_offset: base + first.start..base + last.end,
            });
        }
    }
}

/// Byte ranges of the trimmed, non-empty paragraphs of `text`.
///
/// Any line containing only whitespace separates paragraphs.
fn paragraphs(text: &str) -> Vec<Range<usize>> {
    let mut result = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if line.trim().is_empty() {
            if let Some(range) = current.take() {
                result.push(range);
            }
            continue;
        }

        let line_end = line_start + line.trim_end().len();
        match current.as_mut() {
            Some(range) => range.end = line_end,
            None => {
                let leading = line.len() - line.trim_start().len();
                current = Some(line_start + leading..line_end);
            }
        }
    }

    if let Some(range) = current {
        result.push(range);
    }

    result
}

/// Byte ranges of whitespace-separated words in `text`.
fn word_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push(s..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        spans.push(s..text.len());
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_chars: usize, window: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkConfig {
            max_chars_verbatim: max_chars,
            window_words: window,
            window_overlap_words: overlap,
        })
        .unwrap()
    }

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let result = Chunker::new(ChunkConfig {
            max_chars_verbatim: 100,
            window_words: 10,
            window_overlap_words: 10,
        });
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = Chunker::new(ChunkConfig {
            max_chars_verbatim: 100,
            window_words: 0,
            window_overlap_words: 0,
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_short_paragraphs_are_verbatim() {
        let text = "Cats are mammals.\n\nDogs are mammals too.";
        let chunks = chunker(512, 512, 50).chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, 0);
        assert_eq!(chunks[0].text, "Cats are mammals.");
        assert_eq!(chunks[1].id, 1);
        assert_eq!(chunks[1].text, "Dogs are mammals too.");
        for chunk in &chunks {
            assert_eq!(&text[chunk.source_offset.clone()], chunk.text);
        }
    }

    #[test]
    fn test_blank_paragraphs_discarded() {
        let text = "\n\n  \n\nfirst\n\n\n\n   \n\nsecond\n\n";
        let chunks = chunker(512, 512, 50).chunk(text);

        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_multiline_paragraph_kept_together() {
        let text = "line one\nline two\n\nnext";
        let chunks = chunker(512, 512, 50).chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "line one\nline two");
        assert_eq!(chunks[0].source_offset, 0..17);
    }

    #[test]
    fn test_verbatim_threshold_counts_characters() {
        // 10 characters, 5 of them multi-byte
        let text = "ééééé abcd";
        assert_eq!(text.chars().count(), 10);

        let chunks = chunker(10, 1, 0).chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);

        // One character over the threshold switches to word windows
        let chunks = chunker(9, 1, 0).chunk(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "ééééé");
        assert_eq!(chunks[1].text, "abcd");
    }

    #[test]
    fn test_long_paragraph_windows() {
        let text = numbered_words(30);
        let chunks = chunker(10, 10, 3).chunk(&text);

        // Windows start every 7 words: 0, 7, 14, 21, 28
        assert_eq!(chunks.len(), 5);
        assert!(chunks[0].text.starts_with("w0 "));
        assert!(chunks[0].text.ends_with(" w9"));
        assert!(chunks[1].text.starts_with("w7 "));
        assert_eq!(chunks[4].text, "w28 w29");

        let ids: Vec<_> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_consecutive_windows_share_overlap_words() {
        let text = numbered_words(100);
        let overlap = 4;
        let chunks = chunker(20, 12, overlap).chunk(&text);

        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].text.split(' ').collect();
            let next: Vec<&str> = pair[1].text.split(' ').collect();
            let shared = prev.iter().filter(|w| next.contains(w)).count();
            assert!(
                shared >= overlap.min(next.len()),
                "chunks {} and {} share {} words",
                pair[0].id,
                pair[1].id,
                shared
            );
        }
    }

    #[test]
    fn test_window_offsets_cover_original_span() {
        let text = "intro\n\nalpha  beta\ngamma   delta";
        let chunks = chunker(5, 2, 0).chunk(text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "intro");
        assert_eq!(chunks[1].text, "alpha beta");
        assert_eq!(&text[chunks[1].source_offset.clone()], "alpha  beta");
        assert_eq!(chunks[2].text, "gamma delta");
        assert_eq!(&text[chunks[2].source_offset.clone()], "gamma   delta");
    }

    #[test]
    fn test_every_chunk_non_empty() {
        let text = format!("{}\n\n \n\nshort\n\n{}", numbered_words(57), numbered_words(3));
        for chunk in chunker(15, 8, 2).chunk(&text) {
            assert!(!chunk.text.is_empty());
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(chunker(512, 512, 50).chunk("").is_empty());
        assert!(chunker(512, 512, 50).chunk("\n \n\t\n").is_empty());
    }

    #[test]
    fn test_from_settings() {
        let settings = KnowledgeSettings::default();
        let config = ChunkConfig::from(&settings);
        assert_eq!(config, ChunkConfig::default());
    }
}
