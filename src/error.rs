//! Error types for feedsync
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The HTTP-facing variants mirror the retry classification used by the
//! fetch helper: precondition-failed, rate-limited, and connection errors
//! are transient; an invalidated offset is recoverable; a replica mismatch
//! is fatal to the session.

use thiserror::Error;

/// The main error type for feedsync
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Precondition failed (412): {body}")]
    PreconditionFailed { body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Offset not found (404): {body}")]
    OffsetNotFound { body: String },

    // ============================================================================
    // Session Errors
    // ============================================================================
    #[error("Replica mismatch: session bound to '{expected}' but response came from '{observed}'")]
    ReplicaMismatch { expected: String, observed: String },

    #[error("Retry budget exhausted after {waited_seconds}s: {message}")]
    RetriesExhausted {
        waited_seconds: u64,
        message: String,
    },

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Feed queue closed")]
    QueueClosed,

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a replica mismatch error
    pub fn replica_mismatch(expected: impl Into<String>, observed: impl Into<String>) -> Self {
        Self::ReplicaMismatch {
            expected: expected.into(),
            observed: observed.into(),
        }
    }

    /// Classify an HTTP status code and body into an error variant
    ///
    /// Maps the statuses the retry helper distinguishes; everything else
    /// becomes a generic `HttpStatus`.
    pub fn from_status(status: u16, body: String, retry_after: Option<u64>) -> Self {
        match status {
            412 => Self::PreconditionFailed { body },
            429 => Self::RateLimited {
                retry_after_seconds: retry_after.unwrap_or(60),
            },
            404 => Self::OffsetNotFound { body },
            _ => Self::HttpStatus { status, body },
        }
    }

    /// Check if this error is transient (retried locally, never surfaced)
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_)
            | Error::RateLimited { .. }
            | Error::PreconditionFailed { .. }
            | Error::OffsetNotFound { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error is fatal to the current session
    ///
    /// Fatal errors terminate the worker that observed them and trigger a
    /// full feeder restart.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Error::ReplicaMismatch { .. } | Error::RetriesExhausted { .. }
        )
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for feedsync
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing base url");
        assert_eq!(err.to_string(), "Configuration error: missing base url");

        let err = Error::http_status(502, "Bad gateway");
        assert_eq!(err.to_string(), "HTTP 502: Bad gateway");

        let err = Error::replica_mismatch("node-a", "node-b");
        assert!(err.to_string().contains("node-a"));
        assert!(err.to_string().contains("node-b"));
    }

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            Error::from_status(412, String::new(), None),
            Error::PreconditionFailed { .. }
        ));
        assert!(matches!(
            Error::from_status(429, String::new(), Some(5)),
            Error::RateLimited {
                retry_after_seconds: 5
            }
        ));
        assert!(matches!(
            Error::from_status(404, String::new(), None),
            Error::OffsetNotFound { .. }
        ));
        assert!(matches!(
            Error::from_status(500, String::new(), None),
            Error::HttpStatus { status: 500, .. }
        ));
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_transient());
        assert!(Error::PreconditionFailed {
            body: String::new()
        }
        .is_transient());
        assert!(Error::OffsetNotFound {
            body: String::new()
        }
        .is_transient());
        assert!(Error::http_status(503, "").is_transient());

        assert!(!Error::http_status(401, "").is_transient());
        assert!(!Error::replica_mismatch("a", "b").is_transient());
        assert!(!Error::config("x").is_transient());
    }

    #[test]
    fn test_is_session_fatal() {
        assert!(Error::replica_mismatch("a", "b").is_session_fatal());
        assert!(Error::RetriesExhausted {
            waited_seconds: 300,
            message: "connect".into()
        }
        .is_session_fatal());
        assert!(!Error::http_status(500, "").is_session_fatal());
    }
}
