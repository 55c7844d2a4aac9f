//! Session manager
//!
//! Owns the authenticated identity and its bindings into the presence
//! registry, typing tracker, and channel store. The state machine is
//! `Anonymous -> Authenticating -> Authenticated`, back to `Anonymous` on
//! logout or on a failed authentication attempt. Only `Authenticated`
//! accepts sending, typing, and subscription operations.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use classchat_common::{AppError, AppResult};
use classchat_core::{
    ChannelId, DomainError, Identity, Message, OrderKey, PresenceUpdate, TypingUpdate,
};
use classchat_engine::Subscription;

use crate::dto::{LoginRequest, RegisterRequest};

use super::auth::AuthService;
use super::context::ServiceContext;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No identity; every operation fails with NotAuthenticated
    Anonymous,
    /// Credentials are being checked
    Authenticating,
    /// Identity established; operations are accepted
    Authenticated,
}

/// The identity and bindings held while authenticated
#[derive(Debug, Clone)]
struct ActiveSession {
    identity: Identity,
    current_channel: ChannelId,
}

enum Phase {
    Anonymous,
    Authenticating,
    Authenticated(ActiveSession),
}

/// One client's session against the engine
pub struct SessionManager {
    ctx: Arc<ServiceContext>,
    phase: RwLock<Phase>,
}

impl SessionManager {
    /// Create a manager in the Anonymous state
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            phase: RwLock::new(Phase::Anonymous),
        }
    }

    /// The service context this session runs against
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Log in with username and password.
    ///
    /// On success the session joins presence, announces itself in its
    /// current channel, and lands in `Authenticated`. A session that was
    /// already authenticated is logged out first.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Identity> {
        self.begin_authentication().await?;

        let request = LoginRequest::new(username, password);
        match AuthService::new(&self.ctx).login(request).await {
            Ok(identity) => {
                self.finish_join(identity.clone()).await;
                Ok(identity)
            }
            Err(e) => {
                *self.phase.write().await = Phase::Anonymous;
                Err(e)
            }
        }
    }

    /// Register a new account and enter the chatroom with it
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<Identity> {
        self.begin_authentication().await?;

        match AuthService::new(&self.ctx).register(request).await {
            Ok(identity) => {
                self.finish_join(identity.clone()).await;
                Ok(identity)
            }
            Err(e) => {
                *self.phase.write().await = Phase::Anonymous;
                Err(e)
            }
        }
    }

    /// Log out: clear typing state, leave presence, return to Anonymous.
    /// A no-op for anonymous sessions.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> AppResult<()> {
        let mut phase = self.phase.write().await;
        if let Phase::Authenticated(session) = &*phase {
            let session_id = session.identity.session_id.clone();
            self.ctx.typing().clear_typing(&session_id);
            self.ctx.presence().leave(&session_id);
            info!(session_id = %session_id, "Session logged out");
        }
        *phase = Phase::Anonymous;
        Ok(())
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    /// Send a message to a channel
    pub async fn send_message(&self, channel_id: &ChannelId, content: &str) -> AppResult<Message> {
        let identity = self.require_authenticated().await?;

        let message = self.ctx.store().append(channel_id, &identity, content).await?;

        // A sent message clears the sender's typing indicator, and activity
        // counts as liveness
        self.ctx.typing().clear_typing(&identity.session_id);
        self.ctx.presence().heartbeat(&identity.session_id);

        Ok(message)
    }

    /// Send a teacher announcement to a channel
    pub async fn send_announcement(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> AppResult<Message> {
        let identity = self.require_authenticated().await?;

        if !identity.role.can_announce() {
            return Err(DomainError::MissingPermission(
                "only teachers can make announcements".to_string(),
            )
            .into());
        }

        self.send_message(channel_id, content).await
    }

    /// Switch the session's current channel (clears any typing indicator)
    pub async fn switch_channel(&self, channel_id: &ChannelId) -> AppResult<()> {
        self.ctx.store().ensure_known(channel_id)?;

        let mut phase = self.phase.write().await;
        match &mut *phase {
            Phase::Authenticated(session) => {
                self.ctx.typing().clear_typing(&session.identity.session_id);
                session.current_channel = channel_id.clone();
                Ok(())
            }
            _ => Err(DomainError::NotAuthenticated.into()),
        }
    }

    // =========================================================================
    // Typing & liveness
    // =========================================================================

    /// Record a keystroke in a channel
    pub async fn set_typing(&self, channel_id: &ChannelId) -> AppResult<()> {
        let identity = self.require_authenticated().await?;
        self.ctx.store().ensure_known(channel_id)?;

        self.ctx.typing().set_typing(&identity, channel_id.clone());
        self.ctx.presence().heartbeat(&identity.session_id);
        Ok(())
    }

    /// Clear this session's typing indicator
    pub async fn clear_typing(&self) -> AppResult<()> {
        let identity = self.require_authenticated().await?;
        self.ctx.typing().clear_typing(&identity.session_id);
        Ok(())
    }

    /// Display names typing in a channel, excluding this session
    pub async fn active_typers(&self, channel_id: &ChannelId) -> AppResult<Vec<String>> {
        let identity = self.require_authenticated().await?;
        Ok(self
            .ctx
            .typing()
            .active_typers(channel_id, Some(&identity.session_id)))
    }

    /// Refresh this session's liveness timestamp
    pub async fn heartbeat(&self) -> AppResult<()> {
        let identity = self.require_authenticated().await?;
        self.ctx.presence().heartbeat(&identity.session_id);
        Ok(())
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribe to a channel from a cursor (`OrderKey::ZERO` for the full
    /// history)
    pub async fn subscribe_channel(
        &self,
        channel_id: &ChannelId,
        cursor: OrderKey,
    ) -> AppResult<Subscription<Message>> {
        self.require_authenticated().await?;
        Ok(self.ctx.store().subscribe(channel_id, cursor).await?)
    }

    /// Subscribe to online-set changes (first delivery is the current set)
    pub async fn subscribe_presence(&self) -> AppResult<Subscription<PresenceUpdate>> {
        self.require_authenticated().await?;
        Ok(self.ctx.presence().subscribe())
    }

    /// Subscribe to a channel's typing set (first delivery is the current set)
    pub async fn subscribe_typing(
        &self,
        channel_id: &ChannelId,
    ) -> AppResult<Subscription<TypingUpdate>> {
        self.require_authenticated().await?;
        self.ctx.store().ensure_known(channel_id)?;
        Ok(self.ctx.typing().subscribe(channel_id))
    }

    // =========================================================================
    // State inspection
    // =========================================================================

    /// Current state machine position
    pub async fn state(&self) -> SessionState {
        match &*self.phase.read().await {
            Phase::Anonymous => SessionState::Anonymous,
            Phase::Authenticating => SessionState::Authenticating,
            Phase::Authenticated(_) => SessionState::Authenticated,
        }
    }

    /// The authenticated identity, if any
    pub async fn identity(&self) -> Option<Identity> {
        match &*self.phase.read().await {
            Phase::Authenticated(session) => Some(session.identity.clone()),
            _ => None,
        }
    }

    /// The session's current channel, if authenticated
    pub async fn current_channel(&self) -> Option<ChannelId> {
        match &*self.phase.read().await {
            Phase::Authenticated(session) => Some(session.current_channel.clone()),
            _ => None,
        }
    }

    /// Probe the transport; false means degraded/offline
    pub async fn connection_ok(&self) -> bool {
        self.ctx.transport_ok().await
    }

    /// The fixed channel catalog
    pub fn channels(&self) -> Vec<classchat_core::Channel> {
        self.ctx.store().catalog().iter().cloned().collect()
    }

    /// Number of sessions currently online
    pub fn online_count(&self) -> usize {
        self.ctx.presence().online_count()
    }

    /// Total messages in a channel (the sidebar counter)
    pub async fn message_count(&self, channel_id: &ChannelId) -> AppResult<usize> {
        Ok(self.ctx.store().message_count(channel_id).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Move to Authenticating, logging out a previously authenticated
    /// identity first
    async fn begin_authentication(&self) -> AppResult<()> {
        let mut phase = self.phase.write().await;
        if let Phase::Authenticated(session) = &*phase {
            let session_id = session.identity.session_id.clone();
            self.ctx.typing().clear_typing(&session_id);
            self.ctx.presence().leave(&session_id);
            info!(session_id = %session_id, "Previous identity logged out before re-authentication");
        }
        *phase = Phase::Authenticating;
        Ok(())
    }

    /// Enter Authenticated: join presence, pick the default channel, and
    /// announce the arrival
    async fn finish_join(&self, identity: Identity) {
        self.ctx.presence().join(&identity);

        let current_channel = self
            .ctx
            .store()
            .catalog()
            .iter()
            .next()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ChannelId::from("general"));

        // Best effort: a transport hiccup on the announcement must not undo
        // a successful authentication
        let notice = format!(
            "{} ({}) joined the chatroom",
            identity.display_name, identity.role
        );
        if let Err(e) = self.ctx.store().append_system(&current_channel, &notice).await {
            warn!(error = %e, "Join announcement failed");
        }

        *self.phase.write().await = Phase::Authenticated(ActiveSession {
            identity,
            current_channel,
        });
    }

    /// Fetch the identity or fail with NotAuthenticated
    async fn require_authenticated(&self) -> Result<Identity, AppError> {
        match &*self.phase.read().await {
            Phase::Authenticated(session) => Ok(session.identity.clone()),
            _ => Err(DomainError::NotAuthenticated.into()),
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
