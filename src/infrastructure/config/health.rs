//! Health probe configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::ServiceName;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Per-service probe budget, including the wait for a connection (milliseconds).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Successful probes slower than this are `Degraded` (milliseconds).
    #[serde(default = "default_degraded_latency_threshold_ms")]
    pub degraded_latency_threshold_ms: u64,
    /// Period of background monitoring (seconds).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Services probed by background monitoring.
    #[serde(default = "default_services")]
    pub services: Vec<ServiceName>,
}

const fn default_probe_timeout_ms() -> u64 {
    5_000
}

const fn default_degraded_latency_threshold_ms() -> u64 {
    2_000
}

const fn default_interval_secs() -> u64 {
    60
}

fn default_services() -> Vec<ServiceName> {
    ServiceName::ALL.to_vec()
}

impl HealthConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn degraded_threshold(&self) -> Duration {
        Duration::from_millis(self.degraded_latency_threshold_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            degraded_latency_threshold_ms: default_degraded_latency_threshold_ms(),
            interval_secs: default_interval_secs(),
            services: default_services(),
        }
    }
}
