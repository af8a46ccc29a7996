//! Fetch error type.

use sargassum_common::ViewerError;
use thiserror::Error;

/// Result of a single forecast request.
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a forecast request produced no data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Superseded or withdrawn by the caller. Expected; never logged as a failure.
    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] ViewerError),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Map a reqwest failure onto the shared error type.
pub fn transport_error(err: reqwest::Error) -> ViewerError {
    match (err.status(), err.url()) {
        (Some(status), Some(url)) => ViewerError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        },
        _ if err.is_timeout() => ViewerError::Transport(format!("timed out: {}", err)),
        _ if err.is_decode() => ViewerError::InvalidPayload(err.to_string()),
        _ => ViewerError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_distinct_from_failures() {
        assert!(FetchError::Cancelled.is_cancelled());
        let failed: FetchError = ViewerError::Transport("reset".into()).into();
        assert!(!failed.is_cancelled());
        assert_eq!(failed.to_string(), "Forecast request failed: reset");
    }
}
