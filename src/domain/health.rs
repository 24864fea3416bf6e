//! Aggregated service health.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::service::ServiceName;

/// Health of a single service or of the whole platform.
///
/// Variants are ordered from best to worst so aggregation is a `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    #[must_use]
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Result of probing one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub state: HealthState,
    pub response_time: Duration,
    /// Failure or slowness detail, absent when healthy.
    pub detail: Option<String>,
}

/// One probe round. Built fresh on every check and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    status: HealthState,
    timestamp: DateTime<Utc>,
    duration: Duration,
    services: BTreeMap<ServiceName, ServiceHealth>,
}

impl HealthStatus {
    /// Aggregate per-service results; the overall state is the worst one.
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        duration: Duration,
        services: BTreeMap<ServiceName, ServiceHealth>,
    ) -> Self {
        let status = services
            .values()
            .map(|s| s.state)
            .max()
            .unwrap_or(HealthState::Healthy);
        Self {
            status,
            timestamp,
            duration,
            services,
        }
    }

    pub fn status(&self) -> HealthState {
        self.status
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Wall-clock cost of the probe round.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn services(&self) -> &BTreeMap<ServiceName, ServiceHealth> {
        &self.services
    }

    pub fn service(&self, name: ServiceName) -> Option<&ServiceHealth> {
        self.services.get(&name)
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(state: HealthState, ms: u64) -> ServiceHealth {
        ServiceHealth {
            state,
            response_time: Duration::from_millis(ms),
            detail: None,
        }
    }

    fn status(entries: &[(ServiceName, HealthState)]) -> HealthStatus {
        let services = entries
            .iter()
            .map(|(name, state)| (*name, entry(*state, 10)))
            .collect();
        HealthStatus::new(Utc::now(), Duration::from_millis(10), services)
    }

    #[test]
    fn empty_round_is_healthy() {
        assert_eq!(status(&[]).status(), HealthState::Healthy);
    }

    #[test]
    fn any_unhealthy_wins() {
        let s = status(&[
            (ServiceName::Wsfe, HealthState::Healthy),
            (ServiceName::Wsfex, HealthState::Degraded),
            (ServiceName::Wsaa, HealthState::Unhealthy),
        ]);
        assert_eq!(s.status(), HealthState::Unhealthy);
        assert!(!s.is_healthy());
    }

    #[test]
    fn degraded_without_unhealthy() {
        let s = status(&[
            (ServiceName::Wsfe, HealthState::Healthy),
            (ServiceName::Wsmtxca, HealthState::Degraded),
        ]);
        assert_eq!(s.status(), HealthState::Degraded);
    }

    #[test]
    fn all_healthy() {
        let s = status(&[
            (ServiceName::Wsfe, HealthState::Healthy),
            (ServiceName::Wsfex, HealthState::Healthy),
        ]);
        assert!(s.is_healthy());
        assert_eq!(s.services().len(), 2);
        assert!(s.service(ServiceName::Wsaa).is_none());
    }
}
