//! Error types for the jobs API transport.

use thiserror::Error;

/// Fallback text when neither the body nor the transport explains a failure.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Errors that can occur while talking to the jobs API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server answered with a non-success status
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Request exceeded the configured timeout
    #[error("timeout of {seconds}s exceeded")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },

    /// Connection or protocol failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("failed to parse response: {0}")]
    Decode(String),

    /// A path could not be resolved against the base URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Single human-readable message for the error slot.
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }

    /// HTTP status, when the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
