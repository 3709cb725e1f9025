//! Error types shared across Headaim crates.

use std::path::PathBuf;

/// Top-level error type for Headaim operations.
#[derive(Debug, thiserror::Error)]
pub enum HeadaimError {
    #[error("No usable input source: {message}")]
    NoInputSource { message: String },

    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Calibration error: {message}")]
    Calibration { message: String },

    #[error("Tracking error: {message}")]
    Tracking { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HeadaimError.
pub type HeadaimResult<T> = Result<T, HeadaimError>;

impl HeadaimError {
    pub fn no_input_source(msg: impl Into<String>) -> Self {
        Self::NoInputSource {
            message: msg.into(),
        }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    pub fn calibration(msg: impl Into<String>) -> Self {
        Self::Calibration {
            message: msg.into(),
        }
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
