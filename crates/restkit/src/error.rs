//! Error types for transport and gateway operations.
//!
//! Errors are categorized so the transport can decide what to retry and the
//! callers can tell a missing resource apart from a failing server.

use std::fmt;

/// Result type alias for restkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS or timeout failure (transient, retryable).
    Network,
    /// The server answered with a non-2xx status.
    Status,
    /// The server answered 404.
    NotFound,
    /// The body could not be decoded, or the request could not be built.
    Format,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Status => "Request rejected by the server",
            Self::NotFound => "Resource not found",
            Self::Format => "Malformed request or response",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the management API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error("request failed with status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response text.
        body: String,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Network(String),

    /// The response body was not valid JSON.
    #[error("failed to parse response: {0}")]
    InvalidResponse(String),

    /// The endpoint or path could not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { status: 404, .. } => ErrorCategory::NotFound,
            Self::Http { .. } => ErrorCategory::Status,
            Self::Network(_) => ErrorCategory::Network,
            Self::InvalidResponse(_) | Self::InvalidUrl(_) => ErrorCategory::Format,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::http(code, String::new()),
            ureq::Error::BadUri(uri) => Self::InvalidUrl(uri),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
