//! Error taxonomy for client calls.
//!
//! Every failure is returned to the immediate caller. A call either yields a
//! fully verified [`YopResponse`](crate::YopResponse) or one of these errors,
//! never a partial result.

use std::time::Duration;
use thiserror::Error;

use crate::auth::SigningError;
use crate::config::loader::ConfigError;
use crate::response::VerificationError;

/// Errors surfaced by [`YopClient`](crate::YopClient) operations.
#[derive(Debug, Error)]
pub enum YopError {
    /// The request shape is illegal (no network I/O was attempted).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The request could not be signed (no network I/O was attempted).
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The HTTP call could not be assembled (bad header, unreadable file, multipart failure).
    #[error("Failed to build request: {0}")]
    Build(String),

    /// DNS, connect, timeout or read failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The source of a streaming upload answered with a non-success status.
    #[error("Download of {url} failed with status {status}")]
    Download { url: String, status: u16 },

    /// An analyzer rejected the response.
    #[error("Response rejected by {analyzer}: {source}")]
    Chain {
        analyzer: &'static str,
        #[source]
        source: VerificationError,
    },

    /// Client configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl YopError {
    /// True when the call ended because its deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, YopError::Transport(t) if t.is_timeout())
    }
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The end-to-end deadline expired.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The HTTP stack reported an error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The target URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl TransportError {
    /// True for deadline expiry, including timeouts raised inside reqwest.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout(_) => true,
            TransportError::Http(e) => e.is_timeout(),
            TransportError::InvalidUrl { .. } => false,
        }
    }
}

/// Result type for client operations.
pub type YopResult<T> = Result<T, YopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = YopError::Download {
            url: "http://files.local/a".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "Download of http://files.local/a failed with status 404"
        );

        let err = YopError::Precondition("multipart requires POST".into());
        assert!(err.to_string().contains("multipart requires POST"));
    }

    #[test]
    fn test_timeout_classification() {
        let err = YopError::from(TransportError::Timeout(Duration::from_secs(10)));
        assert!(err.is_timeout());

        let err = YopError::Build("bad header".into());
        assert!(!err.is_timeout());
    }
}
