//! Error types for the Fable gateway

use thiserror::Error;

/// Result type alias for Fable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Fable gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Scenario not found
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// Image generation error
    #[error("image error: {0}")]
    Image(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// API server error
    #[error("api error: {0}")]
    Api(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
