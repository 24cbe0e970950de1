//! Structured error types for repairdoc.
//!
//! Document decoding, API access, configuration, fonts and PDF generation
//! all report through [`RepairDocError`].

use thiserror::Error;

/// The unified error type returned by all public repairdoc functions.
#[derive(Debug, Error)]
pub enum RepairDocError {
    /// JSON input failed to parse as a repair document.
    #[error("Failed to parse document: {source}")]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A required request parameter was not supplied. No I/O was attempted.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The HTTP request could not be performed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    /// A response did not have the expected envelope or item shape.
    #[error("Unexpected response shape: {0}")]
    Schema(String),

    /// Invalid configuration value or file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A font could not be loaded, parsed, or embedded.
    #[error("Font error: {0}")]
    FontError(String),

    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepairDocError {
    /// A human hint for parse failures; empty for every other variant.
    pub fn hint(&self) -> &str {
        match self {
            RepairDocError::ParseError { hint, .. } => hint,
            _ => "",
        }
    }
}

impl From<serde_json::Error> for RepairDocError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but is not a repair document. Expected `processes` with `tasks`."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        RepairDocError::ParseError { source: e, hint }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RepairDocError>;
