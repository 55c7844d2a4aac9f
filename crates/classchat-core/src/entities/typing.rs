//! Typing entity - ephemeral "is typing" state for one session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ChannelId, Identity, SessionId};

/// One typing indicator, scoped to a channel and expiring after a fixed TTL.
///
/// Refreshed on every keystroke event; at most one entry exists per session,
/// so typing in a new channel replaces the previous indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEntry {
    pub session_id: SessionId,
    pub display_name: String,
    pub channel_id: ChannelId,
    pub expires_at: DateTime<Utc>,
}

impl TypingEntry {
    /// Create an entry expiring `ttl` from now
    #[must_use]
    pub fn new(identity: &Identity, channel_id: ChannelId, ttl: chrono::Duration) -> Self {
        Self {
            session_id: identity.session_id.clone(),
            display_name: identity.display_name.clone(),
            channel_id,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Check whether the entry has outlived its TTL
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
