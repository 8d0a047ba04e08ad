//! Error types for the BaatGPT assistant

use thiserror::Error;

/// Result type alias for BaatGPT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a voice interaction
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing API key, bad settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Uploaded audio was rejected before any external call
    #[error("upload error: {0}")]
    Upload(String),

    /// Speech-to-text failed; the request halts
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Chat completion failed; the request halts
    #[error("chat failed: {0}")]
    Chat(String),

    /// Text-to-speech failed; reported as a warning only
    #[error("TTS failed: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error is downgraded to a warning rather than failing the request
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(self, Self::Synthesis(_))
    }
}
