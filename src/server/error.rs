//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A route pattern could not be registered.
    #[error("Invalid route {pattern:?}: {reason}")]
    InvalidRoute { pattern: String, reason: String },

    /// Routes can only be registered before the server starts.
    #[error("Server already started")]
    AlreadyStarted,

    /// Every pooled buffer is in use.
    #[error("Buffer pool exhausted ({capacity} buffers)")]
    PoolExhausted { capacity: usize },

    /// Internal server error raised by a handler.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_route(pattern: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRoute {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
