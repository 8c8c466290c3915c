//! Error types for waveplay
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for waveplay
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio output device errors (open, format negotiation, submit, stream)
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Failed to spawn the per-session notification loop thread
    #[error("Failed to spawn playback thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// Sample format the output path cannot express
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Malformed or inconsistent audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),

    /// Playback session errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// WAV file parsing errors
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using waveplay Error
pub type Result<T> = std::result::Result<T, Error>;
