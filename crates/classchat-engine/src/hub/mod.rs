//! Subscription hub
//!
//! Manages client subscriptions to channels, presence, and typing sources,
//! and delivers change notifications through per-subscriber bounded queues.

mod subscriber_set;
mod subscription;

pub use subscriber_set::SubscriberSet;
pub use subscription::Subscription;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use classchat_core::{ChannelId, Message, PresenceUpdate, TypingUpdate};
use classchat_common::HubConfig;

/// Routes updates from the stores to their subscribers.
///
/// One subscriber registry exists per source: each channel, the presence set,
/// and each channel's typing set. Delivery to one source's subscribers is
/// FIFO per subscriber; nothing is guaranteed across sources. A subscriber
/// whose queue fills up is disconnected rather than ever blocking the
/// producing store.
pub struct SubscriptionHub {
    /// Per-subscriber queue capacity
    queue_capacity: usize,
    /// Monotonic subscription ID counter
    next_id: AtomicU64,
    /// Message subscribers, per channel
    channel_watchers: DashMap<ChannelId, Arc<SubscriberSet<Message>>>,
    /// Online-set subscribers
    presence_watchers: Arc<SubscriberSet<PresenceUpdate>>,
    /// Typing subscribers, per channel
    typing_watchers: DashMap<ChannelId, Arc<SubscriberSet<TypingUpdate>>>,
}

impl SubscriptionHub {
    /// Create a new hub
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            next_id: AtomicU64::new(0),
            channel_watchers: DashMap::new(),
            presence_watchers: Arc::new(SubscriberSet::new()),
            typing_watchers: DashMap::new(),
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared(config: HubConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Get the next subscription ID
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // =========================================================================
    // Channel source
    // =========================================================================

    /// Register a message subscriber for a channel.
    ///
    /// The channel store calls this inside its per-channel critical section
    /// with the replay backlog it computed there, which is what makes the
    /// backlog-then-live hand-off gap-free.
    pub fn subscribe_channel(
        &self,
        channel_id: &ChannelId,
        backlog: Vec<Message>,
    ) -> Subscription<Message> {
        let set = self.channel_set(channel_id);
        let id = self.next_id();
        let receiver = set.attach(id, self.queue_capacity, move || backlog);

        tracing::debug!(subscription_id = id, channel_id = %channel_id, "Channel subscription added");

        Subscription::new(id, receiver, set)
    }

    /// Deliver an appended message to a channel's subscribers
    pub fn publish_message(&self, channel_id: &ChannelId, message: &Message) -> usize {
        let sent = self
            .channel_watchers
            .get(channel_id)
            .map_or(0, |set| set.publish(message));

        tracing::trace!(channel_id = %channel_id, sent = sent, "Message fanned out");

        sent
    }

    /// Number of live subscribers for a channel
    pub fn channel_subscriber_count(&self, channel_id: &ChannelId) -> usize {
        self.channel_watchers
            .get(channel_id)
            .map_or(0, |set| set.len())
    }

    fn channel_set(&self, channel_id: &ChannelId) -> Arc<SubscriberSet<Message>> {
        self.channel_watchers
            .entry(channel_id.clone())
            .or_default()
            .clone()
    }

    // =========================================================================
    // Presence source
    // =========================================================================

    /// Register a presence subscriber.
    ///
    /// The snapshot closure runs while the registry is locked against
    /// concurrent publishes, so the first delivery is a coherent snapshot
    /// followed only by newer updates.
    pub fn subscribe_presence(
        &self,
        snapshot: impl FnOnce() -> PresenceUpdate,
    ) -> Subscription<PresenceUpdate> {
        let id = self.next_id();
        let receiver =
            self.presence_watchers
                .attach(id, self.queue_capacity, move || vec![snapshot()]);

        tracing::debug!(subscription_id = id, "Presence subscription added");

        Subscription::new(id, receiver, Arc::clone(&self.presence_watchers))
    }

    /// Deliver the online set to presence subscribers
    pub fn publish_presence(&self, update: &PresenceUpdate) -> usize {
        let sent = self.presence_watchers.publish(update);
        tracing::trace!(online = update.online_count(), sent = sent, "Presence fanned out");
        sent
    }

    /// Number of live presence subscribers
    pub fn presence_subscriber_count(&self) -> usize {
        self.presence_watchers.len()
    }

    // =========================================================================
    // Typing source
    // =========================================================================

    /// Register a typing subscriber for a channel (first delivery is the
    /// current snapshot, as with presence)
    pub fn subscribe_typing(
        &self,
        channel_id: &ChannelId,
        snapshot: impl FnOnce() -> TypingUpdate,
    ) -> Subscription<TypingUpdate> {
        let set = self.typing_set(channel_id);
        let id = self.next_id();
        let receiver = set.attach(id, self.queue_capacity, move || vec![snapshot()]);

        tracing::debug!(subscription_id = id, channel_id = %channel_id, "Typing subscription added");

        Subscription::new(id, receiver, set)
    }

    /// Deliver a typing-set change to a channel's typing subscribers
    pub fn publish_typing(&self, channel_id: &ChannelId, update: &TypingUpdate) -> usize {
        self.typing_watchers
            .get(channel_id)
            .map_or(0, |set| set.publish(update))
    }

    /// Number of live typing subscribers for a channel
    pub fn typing_subscriber_count(&self, channel_id: &ChannelId) -> usize {
        self.typing_watchers
            .get(channel_id)
            .map_or(0, |set| set.len())
    }

    fn typing_set(&self, channel_id: &ChannelId) -> Arc<SubscriberSet<TypingUpdate>> {
        self.typing_watchers
            .entry(channel_id.clone())
            .or_default()
            .clone()
    }
}

impl std::fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("channels", &self.channel_watchers.len())
            .field("presence_watchers", &self.presence_watchers.len())
            .field("typing_channels", &self.typing_watchers.len())
            .finish()
    }
}
