//! Error types for the breachsim crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the breachsim session controller.
///
/// Failures in this subsystem never surface to the end user as fatal
/// errors; the controller degrades to the local simulator instead. The
/// variants exist so the degradation paths can be logged and tested.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BreachError {
    /// The duplex channel never opened or closed unexpectedly.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An inbound frame failed to parse or did not match the event union.
    #[error("Codec error: {message}")]
    Codec { message: String },

    /// Configuration error (bad endpoint, unparseable URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BreachError {
    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Codec error
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec { .. })
    }

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for BreachError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BreachError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(format!("{} (kind: {:?})", err, err.kind()))
    }
}

/// A type alias for `Result<T, BreachError>`.
pub type Result<T> = std::result::Result<T, BreachError>;
