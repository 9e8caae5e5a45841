//! Error types for wetpaint

use thiserror::Error;

/// The main error type for wetpaint operations
#[derive(Debug, Error)]
pub enum WetpaintError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Result type alias for wetpaint operations
pub type Result<T> = std::result::Result<T, WetpaintError>;

impl From<toml::de::Error> for WetpaintError {
    fn from(err: toml::de::Error) -> Self {
        WetpaintError::TomlParseError(err.to_string())
    }
}

impl From<serde_json::Error> for WetpaintError {
    fn from(err: serde_json::Error) -> Self {
        WetpaintError::JsonError(err.to_string())
    }
}
