//! Error types for list navigation and reconciliation.

use jobdeck_api::ApiError;
use jobdeck_core::JobdeckError;
use std::fmt;
use thiserror::Error;

/// Navigation lanes guarded against overlapping requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLane {
    /// Forward navigation
    Next,
    /// Backward navigation
    Prev,
}

impl fmt::Display for NavLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next"),
            Self::Prev => f.write_str("previous"),
        }
    }
}

/// Errors surfaced by the list controller.
#[derive(Error, Debug)]
pub enum ListError {
    /// The jobs API call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected before reaching the network
    #[error(transparent)]
    Invalid(#[from] JobdeckError),

    /// A request in the same lane is still outstanding
    #[error("{0} page request already in flight")]
    Busy(NavLane),

    /// The caller stopped waiting for the result
    #[error("request was cancelled")]
    Cancelled,
}

impl ListError {
    /// Single human-readable message for the error slot.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Invalid(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// Whether this error should replace the visible error message.
    ///
    /// Rejected duplicate clicks and cancellations are not user-facing.
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::Busy(_) | Self::Cancelled)
    }
}

/// Result type alias for list operations.
pub type Result<T> = std::result::Result<T, ListError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ListError::Busy(NavLane::Next);
        assert_eq!(err.to_string(), "next page request already in flight");
        assert!(!err.is_reportable());

        let err: ListError = ApiError::Timeout { seconds: 10 }.into();
        assert_eq!(err.user_message(), "timeout of 10s exceeded");
        assert!(err.is_reportable());
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err: ListError = JobdeckError::Validation("Name is required".to_string()).into();
        assert_eq!(err.user_message(), "Name is required");
    }
}
