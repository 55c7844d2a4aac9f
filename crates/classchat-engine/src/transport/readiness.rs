//! Transport readiness probe
//!
//! Probes the transport with bounded retry under an overall deadline instead
//! of polling forever. A transport that never comes up is reported as
//! `TransportUnavailable`, and the caller decides whether to degrade or
//! abort.

use std::time::Duration;

use classchat_core::{DomainError, Transport};
use classchat_common::TransportConfig;

/// Wait until the transport reports ready.
///
/// Probes up to `ready_attempts` times with `retry_delay` between probes,
/// all under the `timeout` deadline.
pub async fn await_ready(
    transport: &dyn Transport,
    config: &TransportConfig,
) -> Result<(), DomainError> {
    let probes = probe_loop(transport, config.ready_attempts, config.retry_delay());

    match tokio::time::timeout(config.timeout(), probes).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::TransportUnavailable(format!(
            "transport not ready within {}ms",
            config.ready_timeout_ms
        ))),
    }
}

async fn probe_loop(
    transport: &dyn Transport,
    attempts: u32,
    delay: Duration,
) -> Result<(), DomainError> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match transport.ready().await {
            Ok(()) => {
                tracing::debug!(attempt = attempt, "Transport ready");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Transport readiness probe failed"
                );
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        DomainError::TransportUnavailable("transport never probed".to_string())
    }))
}
