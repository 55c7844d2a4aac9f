//! Presence registry
//!
//! Tracks the online set keyed by session ID. Join and leave are idempotent
//! and last-write-wins per session; watchers receive the full online set on
//! every change. Sessions that stop heartbeating are reaped after a grace
//! period, which turns an abrupt client disappearance into an implicit leave
//! within bounded time.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use classchat_core::{Identity, PresenceEntry, PresenceUpdate, SessionId};
use classchat_common::PresenceConfig;

use crate::hub::{Subscription, SubscriptionHub};

/// Tracks which sessions are online
pub struct PresenceRegistry {
    /// Online entries, at most one per session ID
    entries: DashMap<SessionId, PresenceEntry>,
    /// Serializes mutate-snapshot-publish so watchers never observe two
    /// changes in swapped order
    publish_guard: Mutex<()>,
    hub: Arc<SubscriptionHub>,
    config: PresenceConfig,
}

impl PresenceRegistry {
    /// Create a new registry
    #[must_use]
    pub fn new(hub: Arc<SubscriptionHub>, config: PresenceConfig) -> Self {
        Self {
            entries: DashMap::new(),
            publish_guard: Mutex::new(()),
            hub,
            config,
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared(hub: Arc<SubscriptionHub>, config: PresenceConfig) -> Arc<Self> {
        Arc::new(Self::new(hub, config))
    }

    /// Mark a session online.
    ///
    /// Idempotent per session ID: re-joining replaces the prior entry and
    /// refreshes its liveness timestamp.
    pub fn join(&self, identity: &Identity) {
        let guard = self.publish_guard.lock();
        self.entries
            .insert(identity.session_id.clone(), PresenceEntry::new(identity));

        tracing::info!(
            session_id = %identity.session_id,
            display_name = %identity.display_name,
            online = self.entries.len(),
            "Session joined presence"
        );

        self.publish_locked(&guard);
    }

    /// Mark a session offline. A no-op for sessions that are not online.
    pub fn leave(&self, session_id: &SessionId) {
        let guard = self.publish_guard.lock();
        if self.entries.remove(session_id).is_some() {
            tracing::info!(
                session_id = %session_id,
                online = self.entries.len(),
                "Session left presence"
            );
            self.publish_locked(&guard);
        }
    }

    /// Refresh a session's liveness timestamp
    pub fn heartbeat(&self, session_id: &SessionId) {
        if let Some(mut entry) = self.entries.get_mut(session_id) {
            entry.touch();
        }
    }

    /// The current online set, ordered by display name for stable output
    #[must_use]
    pub fn online(&self) -> Vec<PresenceEntry> {
        let mut entries: Vec<PresenceEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.session_id.as_str().cmp(b.session_id.as_str()))
        });
        entries
    }

    /// Number of sessions online
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.entries.len()
    }

    /// Check if a session is online
    #[must_use]
    pub fn is_online(&self, session_id: &SessionId) -> bool {
        self.entries.contains_key(session_id)
    }

    /// Subscribe to online-set changes.
    ///
    /// The first delivery is the current set; every join, leave, or reaped
    /// session delivers the full set again.
    pub fn subscribe(&self) -> Subscription<PresenceUpdate> {
        let _guard = self.publish_guard.lock();
        self.hub
            .subscribe_presence(|| PresenceUpdate::new(self.online()))
    }

    /// Remove every session whose heartbeats stopped for longer than the
    /// grace period. Returns how many were reaped.
    pub fn sweep_stale(&self) -> usize {
        let guard = self.publish_guard.lock();
        let now = Utc::now();
        let grace = self.config.grace_period();

        let stale: Vec<SessionId> = self
            .entries
            .iter()
            .filter(|e| e.value().is_stale(now, grace))
            .map(|e| e.key().clone())
            .collect();

        for session_id in &stale {
            self.entries.remove(session_id);
            tracing::warn!(
                session_id = %session_id,
                "Session missed its grace period, treating as disconnected"
            );
        }

        if stale.is_empty() {
            0
        } else {
            self.publish_locked(&guard);
            stale.len()
        }
    }

    /// Spawn the background reaper that sweeps stale sessions once per
    /// heartbeat interval. Abort the handle on shutdown.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        let tick = self.config.heartbeat_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                registry.sweep_stale();
            }
        })
    }

    /// Publish the current set while holding the guard
    fn publish_locked(&self, _guard: &parking_lot::MutexGuard<'_, ()>) {
        self.hub.publish_presence(&PresenceUpdate::new(self.online()));
    }
}

impl std::fmt::Debug for PresenceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceRegistry")
            .field("online", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classchat_common::HubConfig;
    use classchat_core::Role;

    fn registry() -> Arc<PresenceRegistry> {
        let hub = SubscriptionHub::new_shared(HubConfig::default());
        PresenceRegistry::new_shared(hub, PresenceConfig::default())
    }

    fn identity(id: &str, name: &str) -> Identity {
        Identity::new(SessionId::from(id), name, Role::Student)
    }

    #[tokio::test]
    async fn test_join_then_leave() {
        let registry = registry();
        let alice = identity("s1", "Alice");

        registry.join(&alice);
        assert!(registry.is_online(&alice.session_id));
        assert_eq!(registry.online_count(), 1);

        registry.leave(&alice.session_id);
        assert!(!registry.is_online(&alice.session_id));
        assert_eq!(registry.online_count(), 0);
    }

    #[tokio::test]
    async fn test_double_join_keeps_one_entry() {
        let registry = registry();
        let alice = identity("s1", "Alice");

        registry.join(&alice);
        registry.join(&alice);
        assert_eq!(registry.online_count(), 1);
    }

    #[tokio::test]
    async fn test_leave_unknown_session_is_noop() {
        let registry = registry();
        registry.leave(&SessionId::from("ghost"));
        assert_eq!(registry.online_count(), 0);
    }

    #[tokio::test]
    async fn test_watchers_get_snapshot_then_changes() {
        let registry = registry();
        registry.join(&identity("s1", "Alice"));

        let mut sub = registry.subscribe();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.online_count(), 1);

        registry.join(&identity("s2", "Bob"));
        let update = sub.recv().await.unwrap();
        assert_eq!(update.online_count(), 2);

        registry.leave(&SessionId::from("s1"));
        let update = sub.recv().await.unwrap();
        assert_eq!(update.online_count(), 1);
        assert_eq!(update.online[0].display_name, "Bob");
    }

    #[tokio::test]
    async fn test_online_sorted_by_display_name() {
        let registry = registry();
        registry.join(&identity("s1", "Zoe"));
        registry.join(&identity("s2", "Alice"));

        let online = registry.online();
        assert_eq!(online[0].display_name, "Alice");
        assert_eq!(online[1].display_name, "Zoe");
    }

    #[tokio::test]
    async fn test_sweep_reaps_only_silent_sessions() {
        let hub = SubscriptionHub::new_shared(HubConfig::default());
        let config = PresenceConfig {
            heartbeat_interval_secs: 1,
            grace_period_secs: 60,
        };
        let registry = PresenceRegistry::new_shared(hub, config);

        let alice = identity("s1", "Alice");
        let bob = identity("s2", "Bob");
        registry.join(&alice);
        registry.join(&bob);

        // Backdate Alice past the grace period
        registry
            .entries
            .get_mut(&alice.session_id)
            .unwrap()
            .last_seen_at = Utc::now() - chrono::Duration::seconds(120);

        assert_eq!(registry.sweep_stale(), 1);
        assert!(!registry.is_online(&alice.session_id));
        assert!(registry.is_online(&bob.session_id));
    }

    #[tokio::test]
    async fn test_heartbeat_defers_reaping() {
        let hub = SubscriptionHub::new_shared(HubConfig::default());
        let config = PresenceConfig {
            heartbeat_interval_secs: 1,
            grace_period_secs: 60,
        };
        let registry = PresenceRegistry::new_shared(hub, config);

        let alice = identity("s1", "Alice");
        registry.join(&alice);
        registry
            .entries
            .get_mut(&alice.session_id)
            .unwrap()
            .last_seen_at = Utc::now() - chrono::Duration::seconds(120);

        registry.heartbeat(&alice.session_id);
        assert_eq!(registry.sweep_stale(), 0);
        assert!(registry.is_online(&alice.session_id));
    }
}
