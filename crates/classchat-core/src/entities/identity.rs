//! Identity entity - the authenticated participant bound to one connection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque per-connection session identifier.
///
/// Generated once at login and never reused; the presence and typing stores
/// key their entries on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID from an existing string value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved session ID used for system announcements
    #[must_use]
    pub fn system() -> Self {
        Self("system".to_string())
    }

    /// Get the inner string value
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    #[default]
    Student,
    /// Reserved for announcements generated by the engine itself
    System,
}

impl Role {
    /// Get the lowercase wire representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::System => "system",
        }
    }

    /// Parse a role from its wire representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Check if this role may publish announcements
    #[inline]
    #[must_use]
    pub fn can_announce(self) -> bool {
        matches!(self, Self::Teacher | Self::System)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity entity representing an authenticated session
///
/// Created at login or registration, immutable for the session lifetime,
/// and discarded on logout or disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub session_id: SessionId,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    /// Create a new Identity
    pub fn new(session_id: SessionId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            session_id,
            display_name: display_name.into(),
            role,
        }
    }

    /// The synthetic identity used by the engine for system announcements
    #[must_use]
    pub fn system() -> Self {
        Self {
            session_id: SessionId::system(),
            display_name: "System".to_string(),
            role: Role::System,
        }
    }

    /// Check if this identity belongs to the engine itself
    #[inline]
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}
