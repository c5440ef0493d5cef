//! Errors raised by service handlers and output helpers.

use thiserror::Error;

/// Failure surfaced by a handler or by one of the output helpers.
///
/// When it reaches the dispatcher before any output was committed, its
/// `Display` text becomes the payload of a 500 JSON error response.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Failure raised by application code; displayed verbatim.
    #[error("{0}")]
    Message(String),

    /// Filesystem or transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or request body decoding failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A computed header value contained forbidden characters.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] hyper::header::InvalidHeaderValue),

    /// An output helper was called after the response was committed.
    #[error("response already sent")]
    AlreadySent,
}

impl ServiceError {
    /// Build a handler failure from any message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
