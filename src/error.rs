//! Error types for quadprint

use thiserror::Error;

/// Result type alias for fingerprinting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fingerprinting error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid fingerprint profile: {0}")]
    InvalidProfile(String),

    // Audio errors
    #[error("Failed to decode audio: {0}")]
    AudioDecode(#[from] hound::Error),

    #[error("Unsupported audio: {0}")]
    UnsupportedAudio(String),

    #[error("Not enough audio: need {needed} samples, got {got}")]
    InsufficientAudio { needed: usize, got: usize },

    // Output errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns a short stable code for the error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidProfile(_) => "INVALID_PROFILE",
            Error::AudioDecode(_) => "AUDIO_DECODE",
            Error::UnsupportedAudio(_) => "AUDIO_UNSUPPORTED",
            Error::InsufficientAudio { .. } => "AUDIO_INSUFFICIENT",
            Error::Image(_) => "IMAGE",
            Error::Io(_) => "IO",
        }
    }
}
