//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Timeouts are short so failing paths finish quickly.

use std::time::Duration;

use crate::domain::ServiceName;
use crate::infrastructure::cache::TicketCacheConfig;
use crate::infrastructure::config::{HealthConfig, PoolConfig};

/// Pool config with the given capacity and borrow timeout.
pub fn pool(max_size: usize, borrow_timeout_ms: u64) -> PoolConfig {
    PoolConfig {
        max_size,
        borrow_timeout_ms,
        per_call_timeout_ms: 1_000,
        idle_timeout_secs: 300,
        connect_timeout_ms: 500,
    }
}

/// Health config probing `services` with the given budget and degraded threshold.
pub fn health(services: &[ServiceName], probe_timeout_ms: u64, degraded_ms: u64) -> HealthConfig {
    HealthConfig {
        probe_timeout_ms,
        degraded_latency_threshold_ms: degraded_ms,
        interval_secs: 1,
        services: services.to_vec(),
    }
}

/// Ticket cache config: 10 minute window, 1 second login timeout.
pub fn ticket_cache(fallback_to_stale: bool) -> TicketCacheConfig {
    TicketCacheConfig {
        expiry_window: Duration::from_secs(600),
        login_timeout: Duration::from_secs(1),
        fallback_to_stale,
    }
}
