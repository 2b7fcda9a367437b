//! Local fallback answering.
//!
//! A sentence-matching heuristic used when the remote generator cannot be
//! reached. It is not a generation model: it picks the first context
//! sentence sharing a keyword with the question. It never fails and never
//! returns empty text.

use std::collections::HashSet;

/// Answer when there is no retrieved context at all.
pub const NO_CONTEXT_ANSWER: &str = "I don't have information about that in my knowledge base. \
Please ask me about topics covered in my knowledge base.";

/// Answer when context exists but no sentence matches the question.
pub const NO_MATCH_ANSWER: &str = "I don't have specific information about that in my knowledge base, \
but I can help you with other topics.";

/// Question words must be longer than this many characters to count.
const MIN_KEYWORD_CHARS: usize = 3;

/// Produce a best-effort answer from `context` for `query`.
///
/// Returns `"Based on the information available: <sentence>."` for the first
/// matching sentence, otherwise one of the fixed "no information" messages.
pub fn fallback_answer(query: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return NO_CONTEXT_ANSWER.to_string();
    }

    let keywords = keywords(query);
    if keywords.is_empty() {
        tracing::debug!("Fallback: query has no usable keywords");
        return NO_MATCH_ANSWER.to_string();
    }

    for sentence in sentences(context) {
        let lower = sentence.to_lowercase();
        if words(&lower).any(|word| keywords.contains(word)) {
            tracing::debug!("Fallback matched sentence ({} chars)", sentence.len());
            return format!("Based on the information available: {}.", sentence);
        }
    }

    NO_MATCH_ANSWER.to_string()
}

/// Lower-cased question words longer than `MIN_KEYWORD_CHARS`.
fn keywords(query: &str) -> HashSet<String> {
    let lower = query.to_lowercase();
    words(&lower)
        .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// Alphanumeric runs of `text`.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Sentences of `context`, split on terminators, with internal whitespace
/// (including line breaks) collapsed.
fn sentences(context: &str) -> impl Iterator<Item = String> + '_ {
    context
        .split(['.', '!', '?'])
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
}
