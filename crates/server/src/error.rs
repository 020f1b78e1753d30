//! Error types for the mesh server.

use thiserror::Error;

/// Main error type for the mesh server.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Configuration errors (invalid YAML, bad x402 block, duplicate tools)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup errors (bind failed, manifest could not be written)
    #[error("Startup error: {0}")]
    Startup(String),

    /// Tool lookup failed
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments did not match the tool's input type
    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// Runtime errors (handler failed, call timed out)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Payment header missing, malformed or rejected
    #[error("Payment error: {0}")]
    Payment(String),

    /// Facilitator HTTP errors
    #[error("Facilitator error: {0}")]
    Facilitator(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<reqwest::Error> for MeshError {
    fn from(value: reqwest::Error) -> Self {
        // Strip the URL; facilitator endpoints may carry credentials in the query string.
        Self::Facilitator(value.without_url().to_string())
    }
}

/// Result type alias for mesh server operations.
pub type Result<T> = std::result::Result<T, MeshError>;
