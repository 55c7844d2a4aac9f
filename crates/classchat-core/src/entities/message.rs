//! Message entity - one immutable entry in a channel's ordered log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ChannelId, Identity, Role, SessionId};
use crate::value_objects::OrderKey;

/// Message entity
///
/// The order key and timestamp are assigned by the channel store inside its
/// per-channel critical section; neither is ever taken from the client.
/// Once appended a message is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: OrderKey,
    pub channel_id: ChannelId,
    pub sender_id: SessionId,
    pub sender_name: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new Message with store-assigned ordering fields
    pub fn new(
        id: OrderKey,
        channel_id: ChannelId,
        sender: &Identity,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            channel_id,
            sender_id: sender.session_id.clone(),
            sender_name: sender.display_name.clone(),
            role: sender.role,
            content,
            created_at,
        }
    }

    /// Check if this is a system announcement
    #[inline]
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }

    /// Get a truncated preview of the content (for log output)
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}
