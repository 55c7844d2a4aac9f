//! Test data fixtures

use std::sync::atomic::{AtomicU32, Ordering};

use classchat_common::{EngineConfig, PresenceConfig, TypingConfig};

/// Counter for unique usernames across tests
static USER_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique username with a prefix
pub fn unique_username(prefix: &str) -> String {
    let n = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}{n}")
}

/// Engine configuration with a 1-second typing TTL and fast sweeps, for
/// tests that wait out an expiry
#[must_use]
pub fn fast_typing_config() -> EngineConfig {
    EngineConfig {
        typing: TypingConfig {
            ttl_secs: 1,
            sweep_interval_secs: 1,
        },
        ..EngineConfig::default()
    }
}

/// Engine configuration with a 1-second presence grace period, for tests
/// that wait for the reaper
#[must_use]
pub fn fast_reaper_config() -> EngineConfig {
    EngineConfig {
        presence: PresenceConfig {
            heartbeat_interval_secs: 1,
            grace_period_secs: 1,
        },
        ..EngineConfig::default()
    }
}
