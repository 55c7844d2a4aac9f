//! Update payloads - snapshots pushed to presence and typing subscribers
//!
//! Channel subscriptions carry `Message` values directly; presence and typing
//! subscriptions carry these snapshot payloads. A reconnecting subscriber
//! re-queries current state by subscribing again (the first delivery is the
//! full snapshot), so no update here needs to be replayable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ChannelId, PresenceEntry};

/// The full online set, emitted on every join, leave, or reaped session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub online: Vec<PresenceEntry>,
    pub timestamp: DateTime<Utc>,
}

impl PresenceUpdate {
    /// Create an update from the current online set
    #[must_use]
    pub fn new(online: Vec<PresenceEntry>) -> Self {
        Self {
            online,
            timestamp: Utc::now(),
        }
    }

    /// Number of sessions currently online
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.online.len()
    }
}

/// The set of display names currently typing in one channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingUpdate {
    pub channel_id: ChannelId,
    pub typers: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl TypingUpdate {
    /// Create an update for a channel's active typers
    #[must_use]
    pub fn new(channel_id: ChannelId, typers: Vec<String>) -> Self {
        Self {
            channel_id,
            typers,
            timestamp: Utc::now(),
        }
    }

    /// Check if nobody is typing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.typers.is_empty()
    }
}
