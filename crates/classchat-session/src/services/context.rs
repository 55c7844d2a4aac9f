//! Service context - dependency container for the session layer
//!
//! Holds the consumed ports, the engine components, and the background tasks
//! that keep presence and typing state honest.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use classchat_common::{AppError, AppResult, EngineConfig, PasswordService};
use classchat_core::{AccountStore, MessageLog, Transport};
use classchat_engine::{
    await_ready, ChannelStore, MemoryBackend, PresenceRegistry, SubscriptionHub, TypingTracker,
};

/// Service context containing all dependencies.
///
/// Built once at startup: probes the transport (bounded retry, never an
/// endless poll), opens the channel store over the durable log, and spawns
/// the presence reaper and typing sweeper. Dropping the context aborts the
/// background tasks.
pub struct ServiceContext {
    config: EngineConfig,
    accounts: Arc<dyn AccountStore>,
    transport: Arc<dyn Transport>,
    store: Arc<ChannelStore>,
    presence: Arc<PresenceRegistry>,
    typing: Arc<TypingTracker>,
    hub: Arc<SubscriptionHub>,
    passwords: PasswordService,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ServiceContext {
    /// Initialize the context over explicit port implementations
    pub async fn initialize(
        config: EngineConfig,
        accounts: Arc<dyn AccountStore>,
        log: Arc<dyn MessageLog>,
        transport: Arc<dyn Transport>,
    ) -> AppResult<Arc<Self>> {
        await_ready(transport.as_ref(), &config.transport)
            .await
            .map_err(AppError::from)?;

        let hub = SubscriptionHub::new_shared(config.hub);
        let store = Arc::new(ChannelStore::open(config.catalog(), Arc::clone(&hub), log).await?);
        let presence = PresenceRegistry::new_shared(Arc::clone(&hub), config.presence);
        let typing = TypingTracker::new_shared(Arc::clone(&hub), config.typing);

        let tasks = vec![presence.spawn_reaper(), typing.spawn_sweeper()];

        tracing::info!(
            app = %config.app_name,
            channels = store.catalog().len(),
            "Service context initialized"
        );

        Ok(Arc::new(Self {
            config,
            accounts,
            transport,
            store,
            presence,
            typing,
            hub,
            passwords: PasswordService::new(),
            tasks: Mutex::new(tasks),
        }))
    }

    /// Initialize over the in-memory backend (single-process deployments and
    /// tests). Returns the backend so callers can reach its test hooks.
    pub async fn initialize_in_memory(
        config: EngineConfig,
    ) -> AppResult<(Arc<Self>, Arc<MemoryBackend>)> {
        let backend = MemoryBackend::new_shared();
        let ctx = Self::initialize(
            config,
            backend.clone(),
            backend.clone(),
            backend.clone(),
        )
        .await?;
        Ok((ctx, backend))
    }

    /// Get the account store
    pub fn accounts(&self) -> &dyn AccountStore {
        self.accounts.as_ref()
    }

    /// Get the channel store
    pub fn store(&self) -> &ChannelStore {
        &self.store
    }

    /// Get the presence registry
    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// Get the typing tracker
    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// Get the subscription hub
    pub fn hub(&self) -> &SubscriptionHub {
        &self.hub
    }

    /// Get the password service
    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Probe the transport once; false means the engine is degraded to a
    /// read-only state (the UI's offline indicator)
    pub async fn transport_ok(&self) -> bool {
        self.transport.ready().await.is_ok()
    }

    /// Abort the background tasks
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        tracing::info!("Service context shut down");
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("app", &self.config.app_name)
            .field("channels", &self.store.catalog().len())
            .field("online", &self.presence.online_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_in_memory() {
        let (ctx, _backend) = ServiceContext::initialize_in_memory(EngineConfig::default())
            .await
            .unwrap();

        assert_eq!(ctx.store().catalog().len(), 7);
        assert_eq!(ctx.presence().online_count(), 0);
        assert!(ctx.transport_ok().await);
    }

    #[tokio::test]
    async fn test_initialize_fails_when_transport_down() {
        let backend = MemoryBackend::new_shared();
        backend.set_online(false);

        let config = EngineConfig {
            transport: classchat_common::TransportConfig {
                ready_attempts: 2,
                ready_retry_delay_ms: 1,
                ready_timeout_ms: 500,
            },
            ..EngineConfig::default()
        };

        let result = ServiceContext::initialize(
            config,
            backend.clone(),
            backend.clone(),
            backend.clone(),
        )
        .await;

        assert!(result.is_err());
    }
}
