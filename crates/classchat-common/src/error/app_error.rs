//! Application error types
//!
//! Unified error handling across the engine and session layers.

use classchat_core::DomainError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Domain errors (auth, validation, transport taxonomy)
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get a stable error code for callers that match on outcomes
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if the error is a transport outage.
    ///
    /// Transport outages put the engine into a degraded read-only state;
    /// presence and typing writes swallow them, message sends surface them.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_transport())
    }

    /// Check if the caller can fix this error (bad input, bad credentials)
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::Domain(e) => {
                e.is_authentication() || e.is_validation() || e.is_conflict()
            }
            Self::Config(_) | Self::Internal(_) => false,
        }
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(msg: impl std::fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
