//! Presence entity - one online session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Identity, Role, SessionId};

/// One entry in the online set.
///
/// Exclusively owned by the presence registry: at most one entry exists per
/// session ID, and the registry removes it when the session leaves or its
/// heartbeats stop for longer than the grace period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub session_id: SessionId,
    pub display_name: String,
    pub role: Role,
    pub last_seen_at: DateTime<Utc>,
}

impl PresenceEntry {
    /// Create an entry for an identity going online
    #[must_use]
    pub fn new(identity: &Identity) -> Self {
        Self {
            session_id: identity.session_id.clone(),
            display_name: identity.display_name.clone(),
            role: identity.role,
            last_seen_at: Utc::now(),
        }
    }

    /// Refresh the liveness timestamp
    pub fn touch(&mut self) {
        self.last_seen_at = Utc::now();
    }

    /// Check whether the entry has gone silent for longer than `grace`
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, grace: chrono::Duration) -> bool {
        now - self.last_seen_at > grace
    }
}
