//! Dictionary "translation" with a tagged fallback.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// (lower-cased source word, target language, translation)
const DICTIONARY: &[(&str, &str, &str)] = &[
    ("hello", "es", "hola"),
    ("hello", "fr", "bonjour"),
    ("goodbye", "es", "adiós"),
    ("goodbye", "fr", "au revoir"),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TranslateInput {
    /// Text to translate.
    pub text: String,
    /// Source language code.
    pub from: String,
    /// Target language code.
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Translation {
    pub original: String,
    pub translated: String,
    pub from: String,
    pub to: String,
}

#[must_use]
pub fn translate(input: TranslateInput) -> Translation {
    let key = input.text.to_lowercase();
    let translated = DICTIONARY
        .iter()
        .find(|(word, lang, _)| *word == key && *lang == input.to)
        .map_or_else(
            || format!("[{}] {}", input.to, input.text),
            |(_, _, t)| (*t).to_string(),
        );

    Translation {
        original: input.text,
        translated,
        from: input.from,
        to: input.to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, to: &str) -> Translation {
        translate(TranslateInput {
            text: text.to_string(),
            from: "en".to_string(),
            to: to.to_string(),
        })
    }

    #[test]
    fn known_words_ignore_case() {
        let t = run("Hello", "fr");
        assert_eq!(t.translated, "bonjour");
        assert_eq!(t.original, "Hello");
        assert_eq!(t.from, "en");
        assert_eq!(run("GOODBYE", "es").translated, "adiós");
    }

    #[test]
    fn unknown_word_or_language_falls_back() {
        assert_eq!(run("thanks", "es").translated, "[es] thanks");
        assert_eq!(run("hello", "de").translated, "[de] hello");
    }
}
