//! In-memory backend
//!
//! Implements every consumed port (message log, account store, transport
//! liveness) against process memory. This is the default backend for
//! single-process deployments and tests; an adapter over a hosted realtime
//! database implements the same traits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use classchat_core::{
    AccountRecord, AccountStore, ChannelId, DomainError, Message, MessageLog, PortResult,
    Transport,
};

/// Memory-backed implementation of the consumed ports.
///
/// `set_online(false)` simulates a backend outage: readiness probes and
/// writes start failing with `TransportUnavailable`, which is how the
/// degraded read-only state is exercised in tests.
pub struct MemoryBackend {
    logs: DashMap<ChannelId, Mutex<Vec<Message>>>,
    accounts: DashMap<String, AccountRecord>,
    online: AtomicBool,
}

impl MemoryBackend {
    /// Create a new backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            logs: DashMap::new(),
            accounts: DashMap::new(),
            online: AtomicBool::new(true),
        }
    }

    /// Create a new backend wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Toggle the simulated backend availability
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Check the simulated availability
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> PortResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(DomainError::TransportUnavailable(
                "memory backend marked offline".to_string(),
            ))
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageLog for MemoryBackend {
    async fn load(&self, channel_id: &ChannelId) -> PortResult<Vec<Message>> {
        self.ensure_online()?;
        Ok(self
            .logs
            .get(channel_id)
            .map(|log| log.lock().clone())
            .unwrap_or_default())
    }

    async fn persist(&self, message: &Message) -> PortResult<()> {
        self.ensure_online()?;
        self.logs
            .entry(message.channel_id.clone())
            .or_default()
            .lock()
            .push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryBackend {
    async fn find_by_username(&self, username: &str) -> PortResult<Option<AccountRecord>> {
        self.ensure_online()?;
        Ok(self.accounts.get(username).map(|r| r.value().clone()))
    }

    async fn username_exists(&self, username: &str) -> PortResult<bool> {
        self.ensure_online()?;
        Ok(self.accounts.contains_key(username))
    }

    async fn create(&self, record: &AccountRecord) -> PortResult<()> {
        self.ensure_online()?;
        // Entry API keeps check-and-insert atomic under concurrent registration
        match self.accounts.entry(record.username.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(DomainError::UsernameTaken(record.username.clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Transport for MemoryBackend {
    async fn ready(&self) -> PortResult<()> {
        self.ensure_online()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("channels", &self.logs.len())
            .field("accounts", &self.accounts.len())
            .field("online", &self.is_online())
            .finish()
    }
}
