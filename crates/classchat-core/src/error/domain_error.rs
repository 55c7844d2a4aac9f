//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::ChannelId;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Credentials too weak: {0}")]
    WeakCredentials(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelId),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),
}

impl DomainError {
    /// Get an error code string for callers that need a stable identifier
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountNotFound(_) => "UNKNOWN_ACCOUNT",
            Self::UsernameTaken(_) => "USERNAME_TAKEN",
            Self::WeakCredentials(_) => "WEAK_CREDENTIALS",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::UnknownChannel(_) => "UNKNOWN_CHANNEL",
            Self::InvalidContent(_) => "INVALID_CONTENT",
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",
            Self::TransportUnavailable(_) => "TRANSPORT_UNAVAILABLE",
        }
    }

    /// Check if this is an authentication error
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::AccountNotFound(_)
                | Self::NotAuthenticated
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::WeakCredentials(_) | Self::UnknownChannel(_) | Self::InvalidContent(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::UsernameTaken(_))
    }

    /// Check if this error came from the transport layer.
    ///
    /// Transport failures on presence/typing writes are logged and swallowed
    /// by the session layer; everything else is surfaced to the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::TransportUnavailable(_))
    }
}
