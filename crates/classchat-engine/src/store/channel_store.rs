//! Channel store
//!
//! One append-only ordered log per catalog channel. All ordering decisions
//! happen here: order keys and timestamps are assigned inside a per-channel
//! critical section, never taken from the client, so concurrent appends from
//! any number of senders collapse into a single total order with ties broken
//! by arrival at the store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use classchat_core::{
    ChannelCatalog, ChannelId, DomainError, Identity, Message, MessageLog, OrderKey,
    OrderKeyGenerator,
};

use crate::hub::{Subscription, SubscriptionHub};

/// Mutable per-channel state, guarded by one async mutex per channel.
///
/// Holding the lock across the persist await is what serializes the whole
/// append path: key assignment, durable write, in-memory tail, and fan-out
/// are one atomic step as far as any other sender or subscriber can tell.
struct ChannelLog {
    messages: Vec<Message>,
    generator: OrderKeyGenerator,
}

/// Durable per-channel ordered message log with live fan-out.
///
/// The channel set is fixed at construction; appends and subscriptions
/// against unknown channels fail with `UnknownChannel`.
pub struct ChannelStore {
    catalog: ChannelCatalog,
    channels: HashMap<ChannelId, Mutex<ChannelLog>>,
    hub: Arc<SubscriptionHub>,
    log: Arc<dyn MessageLog>,
}

impl ChannelStore {
    /// Open the store: load every catalog channel's log from the durable
    /// port and resume each order-key generator past the existing tail
    pub async fn open(
        catalog: ChannelCatalog,
        hub: Arc<SubscriptionHub>,
        log: Arc<dyn MessageLog>,
    ) -> Result<Self, DomainError> {
        let mut channels = HashMap::with_capacity(catalog.len());

        for channel in catalog.iter() {
            let messages = log.load(&channel.id).await?;
            let generator = match messages.last() {
                Some(tail) => OrderKeyGenerator::resume_after(tail.id),
                None => OrderKeyGenerator::new(),
            };

            tracing::debug!(
                channel_id = %channel.id,
                restored = messages.len(),
                "Channel log opened"
            );

            channels.insert(
                channel.id.clone(),
                Mutex::new(ChannelLog { messages, generator }),
            );
        }

        Ok(Self {
            catalog,
            channels,
            hub,
            log,
        })
    }

    /// Append a message to a channel.
    ///
    /// Fails with `InvalidContent` when the content is empty after trimming
    /// and `UnknownChannel` for ids outside the catalog. On success the
    /// message has been persisted and fanned out to every subscriber, the
    /// sender's own subscription included (read-your-writes).
    pub async fn append(
        &self,
        channel_id: &ChannelId,
        sender: &Identity,
        content: &str,
    ) -> Result<Message, DomainError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidContent(
                "message is empty after trimming".to_string(),
            ));
        }

        let entry = self.channel(channel_id)?;
        let mut state = entry.lock().await;

        let key = state.generator.next_key();
        let message = Message::new(
            key,
            channel_id.clone(),
            sender,
            trimmed.to_string(),
            Utc::now(),
        );

        // Persist before anything becomes visible; a failed append leaves no
        // trace in the log or in any subscriber queue
        self.log.persist(&message).await?;

        state.messages.push(message.clone());
        let sent = self.hub.publish_message(channel_id, &message);
        drop(state);

        tracing::info!(
            message_id = %message.id,
            channel_id = %channel_id,
            sender = %message.sender_name,
            subscribers = sent,
            "Message appended"
        );

        Ok(message)
    }

    /// Append a system announcement (join notices and the like)
    pub async fn append_system(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> Result<Message, DomainError> {
        self.append(channel_id, &Identity::system(), content).await
    }

    /// Subscribe from a cursor: replays every message with key > `cursor`,
    /// then continues with live appends.
    ///
    /// Backlog snapshot and subscriber registration happen under the same
    /// per-channel lock as appends, so the hand-off can neither skip nor
    /// duplicate a message.
    pub async fn subscribe(
        &self,
        channel_id: &ChannelId,
        cursor: OrderKey,
    ) -> Result<Subscription<Message>, DomainError> {
        let entry = self.channel(channel_id)?;
        let state = entry.lock().await;

        let backlog: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.id > cursor)
            .cloned()
            .collect();

        let subscription = self.hub.subscribe_channel(channel_id, backlog);
        drop(state);

        Ok(subscription)
    }

    /// Read the messages after a cursor without subscribing
    pub async fn messages_since(
        &self,
        channel_id: &ChannelId,
        cursor: OrderKey,
    ) -> Result<Vec<Message>, DomainError> {
        let entry = self.channel(channel_id)?;
        let state = entry.lock().await;

        Ok(state
            .messages
            .iter()
            .filter(|m| m.id > cursor)
            .cloned()
            .collect())
    }

    /// Total number of messages in a channel
    pub async fn message_count(&self, channel_id: &ChannelId) -> Result<usize, DomainError> {
        let entry = self.channel(channel_id)?;
        Ok(entry.lock().await.messages.len())
    }

    /// The fixed channel catalog
    #[must_use]
    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    /// Validate a channel ID against the catalog
    pub fn ensure_known(&self, channel_id: &ChannelId) -> Result<(), DomainError> {
        if self.catalog.contains(channel_id) {
            Ok(())
        } else {
            Err(DomainError::UnknownChannel(channel_id.clone()))
        }
    }

    fn channel(&self, channel_id: &ChannelId) -> Result<&Mutex<ChannelLog>, DomainError> {
        self.channels
            .get(channel_id)
            .ok_or_else(|| DomainError::UnknownChannel(channel_id.clone()))
    }
}

impl std::fmt::Debug for ChannelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelStore")
            .field("channels", &self.channels.len())
            .finish()
    }
}
