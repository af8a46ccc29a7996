//! Error types for the sargassum viewer crates.

use thiserror::Error;

use crate::time::TimeParseError;

/// Result type alias using ViewerError.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Primary error type for viewer operations.
///
/// There is no cancellation variant: a superseded request is an expected
/// outcome of the fetch coordinator, not a failure.
#[derive(Debug, Error)]
pub enum ViewerError {
    // === Selection Errors ===
    #[error("EEZ not found: {0}")]
    EezNotFound(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    // === Payload Errors ===
    #[error("Invalid forecast payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid EEZ boundary source: {0}")]
    InvalidBoundarySource(String),

    // === Transport Errors ===
    #[error("Forecast request failed: {0}")]
    Transport(String),

    #[error("Forecast endpoint returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewerError {
    /// Whether re-triggering the same action could plausibly succeed.
    ///
    /// Used to pick the log level; nothing is retried automatically.
    pub fn is_transient(&self) -> bool {
        match self {
            ViewerError::Transport(_) => true,
            ViewerError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<TimeParseError> for ViewerError {
    fn from(err: TimeParseError) -> Self {
        ViewerError::InvalidDate(err.to_string())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        ViewerError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::InvalidPayload(format!("JSON error: {}", err))
    }
}
