//! Error types for voicereq.

use crate::request::state::RequestState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoicereqError {
    // Lifecycle errors
    #[error("Cannot {operation} while request is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: RequestState,
    },

    // Adapter errors
    #[error("Adapter reported an error: {message}")]
    AdapterReported { message: String },

    // Driver errors
    #[error("Request driver has stopped")]
    DriverStopped,

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl VoicereqError {
    /// Shorthand for adapter failures.
    pub fn adapter(message: impl Into<String>) -> Self {
        VoicereqError::AdapterReported {
            message: message.into(),
        }
    }

    /// Whether the caller can recover by correcting its usage.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, VoicereqError::InvalidTransition { .. })
    }
}

pub type Result<T> = std::result::Result<T, VoicereqError>;
