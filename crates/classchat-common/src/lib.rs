//! # classchat-common
//!
//! Shared utilities including configuration, error handling, credential
//! hashing, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    hash_password, validate_credentials, verify_password, CredentialPolicy, PasswordService,
};
pub use config::{
    ConfigError, EngineConfig, Environment, HubConfig, PresenceConfig, TransportConfig,
    TypingConfig,
};
pub use error::{AppError, AppResult};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
