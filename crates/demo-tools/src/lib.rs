//! Demo tools for OpenMesh servers.
//!
//! Each tool is a plain function; [`sentiment_tools`] and [`translation_tools`] wrap them for
//! registration on a [`MeshServer`].

pub mod language;
pub mod phrases;
pub mod sentiment;
pub mod translate;

use openmesh_server::{MeshServer, Result, tool};

pub use language::{DetectLanguageInput, DetectedLanguage, detect_language};
pub use phrases::{ExtractPhrasesInput, Phrases, extract_phrases};
pub use sentiment::{Sentiment, SentimentInput, SentimentLabel, sentiment};
pub use translate::{TranslateInput, Translation, translate};

/// Register `sentiment` and `extract_phrases`.
///
/// # Errors
///
/// Returns an error if a tool with the same name is already registered.
pub fn sentiment_tools(server: MeshServer) -> Result<MeshServer> {
    server
        .tool(tool("sentiment", "Analyze sentiment of text", sentiment).pure())?
        .tool(tool("extract_phrases", "Extract key phrases from text", extract_phrases).pure())
}

/// Register `translate` and `detect_language`.
///
/// # Errors
///
/// Returns an error if a tool with the same name is already registered.
pub fn translation_tools(server: MeshServer) -> Result<MeshServer> {
    server
        .tool(tool("translate", "Translate text between languages", translate).pure())?
        .tool(tool("detect_language", "Detect language of text", detect_language).pure())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmesh_server::MeshConfig;
    use serde_json::json;

    #[tokio::test]
    async fn sentiment_app_exposes_both_tools() {
        let server = sentiment_tools(MeshServer::new(MeshConfig::new("sentiment-analyzer")).expect("config"))
            .expect("register");
        let names: Vec<String> = server
            .registry()
            .list()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(names, vec!["sentiment", "extract_phrases"]);

        let result = server
            .registry()
            .call("extract_phrases", json!({ "text": "a b c d", "max_phrases": 1 }), None)
            .await
            .expect("call");
        assert_eq!(result.structured_content, Some(json!({ "phrases": ["a b"] })));
    }

    #[tokio::test]
    async fn translation_app_calls_through_registry() {
        let server = translation_tools(MeshServer::new(MeshConfig::new("translation-service")).expect("config"))
            .expect("register");
        let result = server
            .registry()
            .call("translate", json!({ "text": "hello", "from": "en", "to": "es" }), None)
            .await
            .expect("call");
        assert_eq!(
            result.structured_content,
            Some(json!({ "original": "hello", "translated": "hola", "from": "en", "to": "es" }))
        );
    }

    #[test]
    fn registering_twice_fails() {
        let server = sentiment_tools(MeshServer::new(MeshConfig::new("dup")).expect("config"))
            .expect("register");
        assert!(sentiment_tools(server).is_err());
    }

    #[test]
    fn extract_phrases_schema_defaults_max_phrases() {
        let server = sentiment_tools(MeshServer::new(MeshConfig::new("schema")).expect("config"))
            .expect("register");
        let tools = server.registry().list();
        let extract = tools
            .iter()
            .find(|t| t.name == "extract_phrases")
            .expect("extract_phrases");
        let schema = serde_json::Value::Object(extract.input_schema.as_ref().clone());
        assert_eq!(schema["required"], json!(["text"]));
        assert_eq!(schema["properties"]["max_phrases"]["default"], 5);
    }
}
