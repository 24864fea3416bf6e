//! Ticket acquisition and caching configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Tickets expiring within this window are refreshed (seconds).
    #[serde(default = "default_expiry_window_secs")]
    pub expiry_window_secs: u64,
    /// Half-width of the validity window in the signed login request (seconds).
    #[serde(default = "default_request_window_secs")]
    pub request_window_secs: u64,
    /// Upper bound on one login round trip (milliseconds).
    #[serde(default = "default_login_timeout_ms")]
    pub login_timeout_ms: u64,
    /// Serve a still-valid cached ticket when a refresh fails.
    #[serde(default = "default_fallback_to_stale")]
    pub fallback_to_stale: bool,
}

const fn default_expiry_window_secs() -> u64 {
    600 // 10 minutes
}

const fn default_request_window_secs() -> u64 {
    600
}

const fn default_login_timeout_ms() -> u64 {
    30_000
}

const fn default_fallback_to_stale() -> bool {
    true
}

impl AuthConfig {
    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs(self.expiry_window_secs)
    }

    pub fn request_window(&self) -> Duration {
        Duration::from_secs(self.request_window_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            expiry_window_secs: default_expiry_window_secs(),
            request_window_secs: default_request_window_secs(),
            login_timeout_ms: default_login_timeout_ms(),
            fallback_to_stale: default_fallback_to_stale(),
        }
    }
}
