//! Authentication service
//!
//! Handles registration and login against the account store. Passwords only
//! ever cross this boundary as Argon2 hashes; a fresh opaque session ID is
//! minted for every successful authentication.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use classchat_common::AppResult;
use classchat_core::{AccountRecord, DomainError, Identity, Role, SessionId};

use crate::dto::{LoginRequest, RegisterRequest};

use super::context::ServiceContext;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new account and return the identity for this session
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<Identity> {
        request.check()?;
        self.ctx.passwords().validate(
            &request.username,
            &request.password,
            &request.display_name,
        )?;

        if request.role == Role::System {
            return Err(DomainError::MissingPermission(
                "the system role is reserved".to_string(),
            )
            .into());
        }

        let username = request.username.trim().to_string();
        if self.ctx.accounts().username_exists(&username).await? {
            warn!(username = %username, "Registration failed: username taken");
            return Err(DomainError::UsernameTaken(username).into());
        }

        let password_hash = self.ctx.passwords().hash(&request.password)?;

        let record = AccountRecord {
            username: username.clone(),
            password_hash,
            display_name: request.display_name.trim().to_string(),
            role: request.role,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };

        // The store re-checks atomically; a concurrent duplicate surfaces
        // as UsernameTaken here
        self.ctx.accounts().create(&record).await?;

        info!(username = %username, account_id = %record.id, "Account registered");

        Ok(Identity::new(
            Self::generate_session_id(),
            record.display_name,
            record.role,
        ))
    }

    /// Log in with username and password
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> AppResult<Identity> {
        request.check()?;

        let username = request.username.trim();
        let record = self
            .ctx
            .accounts()
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                warn!(username = %username, "Login failed: account not found");
                DomainError::AccountNotFound(username.to_string())
            })?;

        self.ctx
            .passwords()
            .verify_or_error(&request.password, &record.password_hash)
            .map_err(|e| {
                warn!(username = %username, "Login failed: invalid password");
                e
            })?;

        info!(username = %username, "Login succeeded");

        Ok(Identity::new(
            Self::generate_session_id(),
            record.display_name,
            record.role,
        ))
    }

    /// Generate a new opaque session ID
    #[must_use]
    pub fn generate_session_id() -> SessionId {
        SessionId::new(Uuid::new_v4().to_string())
    }
}
