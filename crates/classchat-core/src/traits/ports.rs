//! Port traits (ports) - define the interface to the excluded backend
//!
//! The engine delegates durable storage and liveness signalling to whatever
//! sits behind these traits: an in-memory implementation for tests and
//! single-process use, or an adapter over a hosted realtime database. The
//! domain layer defines what it needs; the infrastructure layer provides it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{ChannelId, Message, Role};
use crate::error::DomainError;

/// Result type for port operations
pub type PortResult<T> = Result<T, DomainError>;

// ============================================================================
// Message Log
// ============================================================================

/// Durable append-only log, one ordered sequence per channel.
///
/// The channel store assigns order keys before calling `persist`, so an
/// implementation only has to keep what it is given; `load` must return
/// messages in ascending key order.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Load the full log for a channel, ascending by order key
    async fn load(&self, channel_id: &ChannelId) -> PortResult<Vec<Message>>;

    /// Persist one appended message
    async fn persist(&self, message: &Message) -> PortResult<()>;
}

// ============================================================================
// Account Store
// ============================================================================

/// A stored account, keyed by username.
///
/// Only the Argon2 hash of the password is ever stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub username: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: Role,
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by username
    async fn find_by_username(&self, username: &str) -> PortResult<Option<AccountRecord>>;

    /// Check if a username is already registered
    async fn username_exists(&self, username: &str) -> PortResult<bool>;

    /// Create a new account
    ///
    /// Fails with `UsernameTaken` if the username is already registered.
    async fn create(&self, record: &AccountRecord) -> PortResult<()>;
}

// ============================================================================
// Transport
// ============================================================================

/// Liveness of the backing transport.
///
/// Probed with bounded retry at engine construction; a transport that never
/// becomes ready surfaces as `TransportUnavailable` instead of an endless
/// readiness poll.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Check whether the transport can accept reads and writes
    async fn ready(&self) -> PortResult<()>;
}
