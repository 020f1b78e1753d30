//! Naive key-phrase extraction: consecutive word pairs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_PHRASES: i64 = 5;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractPhrasesInput {
    /// Text to extract phrases from.
    pub text: String,
    /// Maximum number of phrases to return. A negative value drops that many phrases from the end.
    #[serde(default = "default_max_phrases")]
    pub max_phrases: i64,
}

fn default_max_phrases() -> i64 {
    DEFAULT_MAX_PHRASES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Phrases {
    pub phrases: Vec<String>,
}

/// Split on whitespace and join non-overlapping word pairs; a trailing odd word is dropped.
#[must_use]
pub fn extract_phrases(input: ExtractPhrasesInput) -> Phrases {
    let words: Vec<&str> = input.text.split_whitespace().collect();
    let mut phrases: Vec<String> = words.chunks_exact(2).map(|pair| pair.join(" ")).collect();
    let keep = phrase_limit(phrases.len(), input.max_phrases);
    phrases.truncate(keep);
    Phrases { phrases }
}

/// How many of `len` phrases survive `max`: the first `max` when non-negative,
/// otherwise all but the last `|max|` (never below zero).
fn phrase_limit(len: usize, max: i64) -> usize {
    let n = usize::try_from(max.unsigned_abs()).unwrap_or(usize::MAX);
    if max >= 0 { len.min(n) } else { len.saturating_sub(n) }
}
