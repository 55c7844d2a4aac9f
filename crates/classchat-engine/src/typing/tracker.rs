//! Typing tracker
//!
//! Ephemeral per-session typing state, scoped to a channel. Every keystroke
//! event refreshes the entry's expiry; entries expire lazily at read time and
//! are also swept proactively so watchers see indicators disappear without a
//! further keystroke. Nothing here is persisted.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use classchat_core::{ChannelId, Identity, SessionId, TypingEntry, TypingUpdate};
use classchat_common::TypingConfig;

use crate::hub::{Subscription, SubscriptionHub};

/// Tracks who is typing in which channel
pub struct TypingTracker {
    /// Typing entries, at most one per session ID
    entries: DashMap<SessionId, TypingEntry>,
    /// Serializes mutate-snapshot-publish per change, as in the presence
    /// registry
    publish_guard: Mutex<()>,
    hub: Arc<SubscriptionHub>,
    config: TypingConfig,
}

impl TypingTracker {
    /// Create a new tracker
    #[must_use]
    pub fn new(hub: Arc<SubscriptionHub>, config: TypingConfig) -> Self {
        Self {
            entries: DashMap::new(),
            publish_guard: Mutex::new(()),
            hub,
            config,
        }
    }

    /// Create a new tracker wrapped in Arc
    #[must_use]
    pub fn new_shared(hub: Arc<SubscriptionHub>, config: TypingConfig) -> Arc<Self> {
        Arc::new(Self::new(hub, config))
    }

    /// Record a keystroke: create or refresh the session's typing entry.
    ///
    /// A session types in at most one channel; typing somewhere new moves
    /// the indicator there and notifies both channels' watchers.
    pub fn set_typing(&self, identity: &Identity, channel_id: ChannelId) {
        let guard = self.publish_guard.lock();

        let entry = TypingEntry::new(identity, channel_id.clone(), self.config.ttl());
        let previous = self.entries.insert(identity.session_id.clone(), entry);

        if let Some(prev) = previous.filter(|p| p.channel_id != channel_id) {
            self.publish_channel(&guard, &prev.channel_id);
        }
        self.publish_channel(&guard, &channel_id);

        tracing::trace!(
            session_id = %identity.session_id,
            channel_id = %channel_id,
            "Typing refreshed"
        );
    }

    /// Clear a session's typing state (message sent, input cleared, logout)
    pub fn clear_typing(&self, session_id: &SessionId) {
        let guard = self.publish_guard.lock();
        if let Some((_, entry)) = self.entries.remove(session_id) {
            self.publish_channel(&guard, &entry.channel_id);
            tracing::trace!(session_id = %session_id, "Typing cleared");
        }
    }

    /// Display names typing in a channel right now, excluding the caller.
    ///
    /// Expiry is checked here against the current clock, so an entry is never
    /// reported past its TTL even if no sweep has run yet.
    #[must_use]
    pub fn active_typers(
        &self,
        channel_id: &ChannelId,
        exclude: Option<&SessionId>,
    ) -> Vec<String> {
        let now = Utc::now();
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|e| {
                let entry = e.value();
                entry.channel_id == *channel_id
                    && !entry.is_expired(now)
                    && exclude != Some(&entry.session_id)
            })
            .map(|e| e.value().display_name.clone())
            .collect();
        names.sort();
        names
    }

    /// Subscribe to a channel's typing set.
    ///
    /// The first delivery is the current set (excluding nobody); changes
    /// follow as keystrokes arrive, indicators expire, or entries are
    /// cleared.
    pub fn subscribe(&self, channel_id: &ChannelId) -> Subscription<TypingUpdate> {
        let _guard = self.publish_guard.lock();
        self.hub.subscribe_typing(channel_id, || {
            TypingUpdate::new(channel_id.clone(), self.active_typers(channel_id, None))
        })
    }

    /// Drop expired entries and notify the affected channels.
    /// Returns how many entries were dropped.
    pub fn sweep_expired(&self) -> usize {
        let guard = self.publish_guard.lock();
        let now = Utc::now();

        let expired: Vec<(SessionId, ChannelId)> = self
            .entries
            .iter()
            .filter(|e| e.value().is_expired(now))
            .map(|e| (e.key().clone(), e.value().channel_id.clone()))
            .collect();

        let mut channels: Vec<ChannelId> = Vec::new();
        for (session_id, channel_id) in &expired {
            self.entries.remove(session_id);
            if !channels.contains(channel_id) {
                channels.push(channel_id.clone());
            }
        }

        for channel_id in &channels {
            self.publish_channel(&guard, channel_id);
        }

        expired.len()
    }

    /// Spawn the background sweeper. Abort the handle on shutdown.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let tick = self.config.sweep_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tracker.sweep_expired();
            }
        })
    }

    /// Publish a channel's current typer set while holding the guard
    fn publish_channel(&self, _guard: &parking_lot::MutexGuard<'_, ()>, channel_id: &ChannelId) {
        let update = TypingUpdate::new(channel_id.clone(), self.active_typers(channel_id, None));
        self.hub.publish_typing(channel_id, &update);
    }
}

impl std::fmt::Debug for TypingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingTracker")
            .field("entries", &self.entries.len())
            .finish()
    }
}
