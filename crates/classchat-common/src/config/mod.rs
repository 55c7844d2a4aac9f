//! Configuration loading

mod app_config;

pub use app_config::{
    ConfigError, EngineConfig, Environment, HubConfig, PresenceConfig, TransportConfig,
    TypingConfig,
};
