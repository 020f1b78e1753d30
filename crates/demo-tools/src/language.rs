//! Character-class language detection.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MATCH_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Checked in order; the first match wins.
static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("es", r"(?i)[áéíóúñ]"),
        ("fr", r"(?i)[àâçéèêëïîôùûü]"),
        ("en", r"^[a-zA-Z\s]+$"),
    ]
    .into_iter()
    .map(|(lang, re)| (lang, Regex::new(re).expect("valid language pattern")))
    .collect()
});

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DetectLanguageInput {
    /// Text to classify.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct DetectedLanguage {
    pub language: String,
    pub confidence: f64,
}

#[must_use]
pub fn detect_language(input: DetectLanguageInput) -> DetectedLanguage {
    let hit = PATTERNS.iter().find(|(_, re)| re.is_match(&input.text));
    match hit {
        Some((lang, _)) => DetectedLanguage {
            language: (*lang).to_string(),
            confidence: MATCH_CONFIDENCE,
        },
        None => DetectedLanguage {
            language: "en".to_string(),
            confidence: FALLBACK_CONFIDENCE,
        },
    }
}
