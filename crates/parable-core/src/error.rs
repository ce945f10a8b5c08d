//! Error types for parable.

use std::time::Duration;

use thiserror::Error;

use crate::models::UnavailabilityReason;

/// Result type alias using parable's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for categorization and storage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input was empty or whitespace-only after trimming.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// No backend usable, or a backend precondition is missing.
    #[error("Categorization unavailable: {0}")]
    ServiceUnavailable(UnavailabilityReason),

    /// Remote backend throttled the request.
    #[error("{}", rate_limited_message(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Remote backend returned a non-success, non-429 status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Transport-level timeout.
    #[error("Request timed out")]
    Timeout,

    /// Training example or note storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed response, JSON failure, or anything else unexpected.
    #[error("Unknown error: {0}")]
    Unknown(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn rate_limited_message(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!("Rate limited. Retry in {} seconds.", d.as_secs()),
        None => "Rate limited. Please try again later.".to_string(),
    }
}

impl Error {
    /// Whether a caller may reasonably retry the same input later.
    ///
    /// Nothing in parable retries on its own; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Timeout | Error::Network(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Backoff hint carried by a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Unknown(format!("Invalid JSON: {}", e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_content() {
        let err = Error::InvalidContent("Content cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid content: Content cannot be empty");
    }

    #[test]
    fn test_error_display_service_unavailable() {
        let err = Error::ServiceUnavailable(UnavailabilityReason::NoApiKey);
        assert_eq!(err.to_string(), "Categorization unavailable: no_api_key");
    }

    #[test]
    fn test_error_display_rate_limited_with_retry() {
        let err = Error::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "Rate limited. Retry in 30 seconds.");
    }

    #[test]
    fn test_error_display_rate_limited_without_retry() {
        let err = Error::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "Rate limited. Please try again later.");
    }

    #[test]
    fn test_error_display_api() {
        let err = Error::Api {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): invalid api key");
    }

    #[test]
    fn test_error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::RateLimited { retry_after: None }.is_retryable());
        assert!(Error::Timeout.is_retryable());
        assert!(Error::Network("reset".into()).is_retryable());
        assert!(Error::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());

        assert!(!Error::Api {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!Error::InvalidContent("empty".into()).is_retryable());
        assert!(!Error::ServiceUnavailable(UnavailabilityReason::NoNetwork).is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_rate_limit() {
        let err = Error::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
        assert_eq!(Error::Timeout.retry_after(), None);
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Unknown(msg) => assert!(msg.starts_with("Invalid JSON")),
            other => panic!("Expected Unknown error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
