//! Connection pool configuration.

use std::time::Duration;

use serde::Deserialize;

/// Limits and timeouts for pooled transport connections.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections, checked out or idle.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// How long `borrow` waits for capacity before failing (milliseconds).
    #[serde(default = "default_borrow_timeout_ms")]
    pub borrow_timeout_ms: u64,
    /// Timeout applied to each business call (milliseconds).
    #[serde(default = "default_per_call_timeout_ms")]
    pub per_call_timeout_ms: u64,
    /// Idle connections older than this are discarded on borrow (seconds).
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// TCP/TLS connect timeout for new connections (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

const fn default_max_size() -> usize {
    10
}

const fn default_borrow_timeout_ms() -> u64 {
    5_000
}

const fn default_per_call_timeout_ms() -> u64 {
    30_000
}

const fn default_idle_timeout_secs() -> u64 {
    300 // 5 minutes
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl PoolConfig {
    pub fn borrow_timeout(&self) -> Duration {
        Duration::from_millis(self.borrow_timeout_ms)
    }

    pub fn per_call_timeout(&self) -> Duration {
        Duration::from_millis(self.per_call_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            borrow_timeout_ms: default_borrow_timeout_ms(),
            per_call_timeout_ms: default_per_call_timeout_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}
