//! Error types for the fallible setup paths
//!
//! The per-frame simulation never returns these; they only surface while
//! loading configuration, audio clips or the voice engine.

use thiserror::Error;

/// Settings or tuning file could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File contents were not valid JSON for the expected shape
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An audio clip could not be loaded
#[derive(Debug, Error)]
pub enum AudioError {
    /// Clip file is missing
    #[error("Missing clip: {0}")]
    MissingClip(String),
    /// Backend refused the clip
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// The voice engine is not usable
#[derive(Debug, Error)]
pub enum NarrationError {
    /// No engine is installed on this platform
    #[error("Voice engine unavailable")]
    Unavailable,
    /// Engine failed while speaking
    #[error("Voice engine error: {0}")]
    Engine(String),
}
