//! Error types for Clipscout.

use thiserror::Error;

/// Library-level error type for Clipscout operations.
#[derive(Error, Debug)]
pub enum ClipscoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("LLM service error: {0}")]
    LlmService(String),

    #[error("Could not parse LLM response: {0}")]
    Parse(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Clipscout operations.
pub type Result<T> = std::result::Result<T, ClipscoutError>;
