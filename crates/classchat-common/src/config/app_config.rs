//! Engine configuration structs
//!
//! Loads configuration from environment variables (with `.env` support).
//! Every tunable has a default, so an empty environment yields a working
//! single-process engine.

use serde::Deserialize;
use std::env;
use std::time::Duration;

use classchat_core::{Channel, ChannelCatalog};

/// Main engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Channel catalog override as `slug=Display Name` pairs; None keeps the
    /// built-in classroom catalog
    #[serde(default)]
    pub channels: Option<Vec<(String, String)>>,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Typing indicator configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TypingConfig {
    /// Seconds a typing indicator survives without a refresh
    #[serde(default = "default_typing_ttl_secs")]
    pub ttl_secs: u64,
    /// Seconds between proactive sweeps of expired indicators
    #[serde(default = "default_typing_sweep_secs")]
    pub sweep_interval_secs: u64,
}

impl TypingConfig {
    /// TTL as a chrono duration (entries compare against wall-clock expiry)
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }

    /// Sweep interval as a std duration (drives the tokio interval)
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_typing_ttl_secs(),
            sweep_interval_secs: default_typing_sweep_secs(),
        }
    }
}

/// Presence / liveness configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PresenceConfig {
    /// Seconds between expected client heartbeats
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Seconds of silence after which a session counts as disconnected
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,
}

impl PresenceConfig {
    /// Heartbeat interval (also the reaper tick)
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Grace period before an implicit leave
    #[must_use]
    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.grace_period_secs as i64)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            grace_period_secs: default_grace_period_secs(),
        }
    }
}

/// Subscription hub configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HubConfig {
    /// Per-subscriber queue capacity; a subscriber that falls this far
    /// behind is disconnected rather than blocking producers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Transport readiness configuration
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TransportConfig {
    /// Readiness probe attempts before giving up
    #[serde(default = "default_ready_attempts")]
    pub ready_attempts: u32,
    /// Delay between readiness probes, in milliseconds
    #[serde(default = "default_ready_retry_delay_ms")]
    pub ready_retry_delay_ms: u64,
    /// Overall readiness deadline, in milliseconds
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl TransportConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.ready_retry_delay_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ready_attempts: default_ready_attempts(),
            ready_retry_delay_ms: default_ready_retry_delay_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "classchat".to_string()
}

fn default_typing_ttl_secs() -> u64 {
    3
}

fn default_typing_sweep_secs() -> u64 {
    1
}

fn default_heartbeat_interval_secs() -> u64 {
    15
}

fn default_grace_period_secs() -> u64 {
    45
}

fn default_queue_capacity() -> usize {
    256
}

fn default_ready_attempts() -> u32 {
    5
}

fn default_ready_retry_delay_ms() -> u64 {
    200
}

fn default_ready_timeout_ms() -> u64 {
    5000
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
            env: env::var("APP_ENV")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "production" => Some(Environment::Production),
                    "development" => Some(Environment::Development),
                    _ => None,
                })
                .unwrap_or_default(),
            typing: TypingConfig {
                ttl_secs: parse_var("TYPING_TTL_SECS", default_typing_ttl_secs)?,
                sweep_interval_secs: parse_var("TYPING_SWEEP_SECS", default_typing_sweep_secs)?,
            },
            presence: PresenceConfig {
                heartbeat_interval_secs: parse_var(
                    "HEARTBEAT_INTERVAL_SECS",
                    default_heartbeat_interval_secs,
                )?,
                grace_period_secs: parse_var("PRESENCE_GRACE_SECS", default_grace_period_secs)?,
            },
            hub: HubConfig {
                queue_capacity: parse_var("SUBSCRIBER_QUEUE_CAPACITY", default_queue_capacity)?,
            },
            transport: TransportConfig {
                ready_attempts: parse_var("TRANSPORT_READY_ATTEMPTS", default_ready_attempts)?,
                ready_retry_delay_ms: parse_var(
                    "TRANSPORT_READY_RETRY_MS",
                    default_ready_retry_delay_ms,
                )?,
                ready_timeout_ms: parse_var("TRANSPORT_READY_TIMEOUT_MS", default_ready_timeout_ms)?,
            },
            channels: match env::var("CHANNELS") {
                Ok(raw) => Some(parse_channel_list(&raw)?),
                Err(_) => None,
            },
        })
    }

    /// Build the channel catalog this configuration describes
    #[must_use]
    pub fn catalog(&self) -> ChannelCatalog {
        match &self.channels {
            Some(pairs) => ChannelCatalog::new(
                pairs
                    .iter()
                    .map(|(slug, name)| Channel::new(slug.clone(), name.clone()))
                    .collect(),
            ),
            None => ChannelCatalog::classroom(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            env: Environment::default(),
            typing: TypingConfig::default(),
            presence: PresenceConfig::default(),
            hub: HubConfig::default(),
            transport: TransportConfig::default(),
            channels: None,
        }
    }
}

/// Parse an env var, falling back to the default when unset
fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default()),
    }
}

/// Parse `slug=Display Name,slug2=Other` channel overrides
fn parse_channel_list(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(slug, name)| (slug.trim().to_string(), name.trim().to_string()))
                .filter(|(slug, name)| !slug.is_empty() && !name.is_empty())
                .ok_or_else(|| ConfigError::InvalidValue("CHANNELS", pair.to_string()))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
