use std::time::Duration;
use thiserror::Error;

/// Errors raised while driving a navigation session
#[derive(Debug, Error)]
pub enum NavError {
    /// Credentials were rejected or the login page was never left
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Every strategy of a mandatory step was exhausted
    #[error("Navigation step '{step}' failed: {reason}")]
    NavigationFailure { step: String, reason: String },

    /// A mandatory confirmation did not hold within its budget
    #[error("Timed out after {waited:?} waiting for {what}")]
    ConfirmationTimeout { what: String, waited: Duration },

    /// All interaction techniques failed against an element
    #[error("Interaction failed: {0}")]
    InteractionFailure(String),

    /// The secret store could not produce credentials
    #[error("Secret retrieval failed: {0}")]
    SecretRetrievalFailure(String),

    /// No element satisfied a locator within its budget
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The browser process could not be started
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// A browser command failed
    #[error("Browser operation failed: {0}")]
    DriverFailed(String),

    /// A step was entered from a state it does not accept
    #[error("Step '{step}' cannot run from state {actual} (expected one of: {expected})")]
    PreconditionFailed { step: String, expected: String, actual: String },

    /// The session state machine was asked for a transition it does not have
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// The invocation deadline cut a wait short
    #[error("Invocation deadline exceeded while waiting for {0}")]
    DeadlineExceeded(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NavError {
    /// Whether the error came from a bounded wait running out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, NavError::ConfirmationTimeout { .. } | NavError::ElementNotFound(_))
    }

    /// Whether the invocation deadline has passed; such errors are never swallowed
    pub fn is_deadline(&self) -> bool {
        matches!(self, NavError::DeadlineExceeded(_))
    }
}

/// Result type alias for navigation operations
pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let timeout = NavError::ConfirmationTimeout { what: "url".to_string(), waited: Duration::from_secs(1) };
        assert!(timeout.is_timeout());
        assert!(NavError::ElementNotFound("tab".to_string()).is_timeout());
        assert!(!NavError::DriverFailed("boom".to_string()).is_timeout());
    }

    #[test]
    fn test_deadline_is_distinguishable() {
        let err = NavError::DeadlineExceeded("login redirect".to_string());
        assert!(err.is_deadline());
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "Invocation deadline exceeded while waiting for login redirect");
    }
}
