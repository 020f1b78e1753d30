//! Keyword-count sentiment scoring.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const POSITIVE_WORDS: [&str; 4] = ["good", "great", "excellent", "amazing"];
const NEGATIVE_WORDS: [&str; 4] = ["bad", "terrible", "awful", "horrible"];

/// Fixed confidence reported for a non-neutral verdict.
pub const CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SentimentInput {
    /// Text to analyze.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Sentiment {
    /// `0.8`, `-0.8` or `0.0`.
    pub score: f64,
    pub label: SentimentLabel,
}

/// Score `text` by counting which list words occur in it.
///
/// Matching is by substring on the lower-cased text and each list word counts once, so
/// `"goodbye"` counts as positive and `"good good"` scores the same as `"good"`.
#[must_use]
pub fn sentiment(input: SentimentInput) -> Sentiment {
    let lowered = input.text.to_lowercase();
    let count = |words: &[&str]| words.iter().filter(|w| lowered.contains(*w)).count();
    let positive = count(&POSITIVE_WORDS);
    let negative = count(&NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment {
            score: CONFIDENCE,
            label: SentimentLabel::Positive,
        },
        std::cmp::Ordering::Less => Sentiment {
            score: -CONFIDENCE,
            label: SentimentLabel::Negative,
        },
        std::cmp::Ordering::Equal => Sentiment {
            score: 0.0,
            label: SentimentLabel::Neutral,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Sentiment {
        sentiment(SentimentInput {
            text: text.to_string(),
        })
    }

    #[test]
    fn more_positive_words_is_positive() {
        let s = run("The food was GREAT and the service excellent, a bit bad parking");
        assert_eq!(s.label, SentimentLabel::Positive);
        assert!((s.score - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn more_negative_words_is_negative() {
        let s = run("terrible, just awful");
        assert_eq!(s.label, SentimentLabel::Negative);
        assert!((s.score + 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_and_empty_text_are_neutral() {
        for text in ["", "nothing to see", "good but bad"] {
            let s = run(text);
            assert_eq!(s.label, SentimentLabel::Neutral, "text: {text:?}");
            assert!(s.score.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn words_match_as_substrings_once_each() {
        assert_eq!(run("goodbye").label, SentimentLabel::Positive);
        // Two occurrences of "bad" still count once against one "good".
        assert_eq!(run("good bad bad").label, SentimentLabel::Neutral);
    }

    #[test]
    fn label_serializes_lowercase() {
        let v = serde_json::to_value(run("amazing")).expect("json");
        assert_eq!(v, serde_json::json!({ "score": 0.8, "label": "positive" }));
    }
}
