//! Error types for gesturectl.

use crate::gesture::ControlAction;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Frame errors
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String },

    #[error("Frame source failed: {message}")]
    FrameSource { message: String },

    // Classifier errors
    #[error("Classifier unavailable: {message}")]
    ClassifierUnavailable { message: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    // Playback errors
    #[error("Playback sink rejected {action}: {reason}")]
    SinkRejected {
        action: ControlAction,
        reason: String,
    },

    // Replay script errors
    #[error("Script line {line}: {message}")]
    Script { line: usize, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl GestureError {
    /// Shorthand for a malformed-frame error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// Shorthand for a sink rejection.
    pub fn rejected(action: ControlAction, reason: impl Into<String>) -> Self {
        Self::SinkRejected {
            action,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GestureError>;
