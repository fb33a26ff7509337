//! Error types for the Kubescrub Operator

use thiserror::Error;

/// Result type alias using the operator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Operator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spec field failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Child cannot be owned by the parent
    #[error("Ownership error: {0}")]
    Ownership(String),

    /// Required metadata field is absent
    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),

    /// Store call aborted by the reconcile's cancellation signal
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Store call exceeded the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an ownership error
    pub fn ownership(msg: impl Into<String>) -> Self {
        Error::Ownership(msg.into())
    }

    /// Whether redelivering the same key may succeed without a spec change
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Kube(_) | Error::Cancelled(_) | Error::Timeout(_)
        )
    }

    /// Whether the error stems from the parent's spec and must be reported on its status
    pub fn is_permanent(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Ownership(_))
    }
}
