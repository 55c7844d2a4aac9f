//! Test helpers
//!
//! A `TestEngine` is one in-memory engine instance; each simulated client is
//! a `SessionManager` sharing that engine's service context.

use std::sync::Arc;

use classchat_common::EngineConfig;
use classchat_core::Role;
use classchat_engine::MemoryBackend;
use classchat_session::{RegisterRequest, ServiceContext, SessionManager};

use crate::fixtures::unique_username;

/// One engine instance under test
pub struct TestEngine {
    pub ctx: Arc<ServiceContext>,
    pub backend: Arc<MemoryBackend>,
}

impl TestEngine {
    /// Start an engine with the default configuration
    pub async fn start() -> Self {
        Self::start_with_config(EngineConfig::default()).await
    }

    /// Start an engine with a custom configuration
    pub async fn start_with_config(config: EngineConfig) -> Self {
        let (ctx, backend) = ServiceContext::initialize_in_memory(config)
            .await
            .expect("engine failed to initialize");
        Self { ctx, backend }
    }

    /// A fresh anonymous session against this engine
    pub fn session(&self) -> SessionManager {
        SessionManager::new(Arc::clone(&self.ctx))
    }

    /// Register and join a student with a unique username
    pub async fn join_student(&self, display_name: &str) -> SessionManager {
        self.join_with_role(display_name, Role::Student).await
    }

    /// Register and join a teacher with a unique username
    pub async fn join_teacher(&self, display_name: &str) -> SessionManager {
        self.join_with_role(display_name, Role::Teacher).await
    }

    async fn join_with_role(&self, display_name: &str, role: Role) -> SessionManager {
        let session = self.session();
        session
            .register(RegisterRequest::new(
                unique_username("user"),
                "abc123",
                display_name,
                role,
            ))
            .await
            .expect("registration failed");
        session
    }
}
