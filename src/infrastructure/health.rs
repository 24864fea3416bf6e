//! On-demand and periodic health probing.
//!
//! Each round probes the requested services concurrently through the pool,
//! one status call per service, each bounded by `probe_timeout` (which also
//! covers waiting for a connection). Probe failures become `Unhealthy`
//! entries; they never abort the round.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::adapter::probe;
use crate::domain::{Endpoints, HealthState, HealthStatus, ServiceHealth, ServiceName};
use crate::error::HealthProbeError;
use crate::infrastructure::config::HealthConfig;
use crate::infrastructure::pool::ConnectionPool;

/// Probes services through the shared pool and keeps the latest round.
pub struct HealthMonitor {
    /// Pool the probes borrow from.
    pool: ConnectionPool,
    /// Address of each service's status operation.
    endpoints: Endpoints,
    /// Timeouts, thresholds and the background interval.
    config: HealthConfig,
    /// Most recent round, on demand or background.
    latest: RwLock<Option<HealthStatus>>,
}

impl HealthMonitor {
    pub fn new(pool: ConnectionPool, endpoints: Endpoints, config: HealthConfig) -> Self {
        Self {
            pool,
            endpoints,
            config,
            latest: RwLock::new(None),
        }
    }

    /// Configuration the monitor was built with.
    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Probe `services` and aggregate. Duplicates are probed once.
    pub async fn check_health(&self, services: &[ServiceName]) -> HealthStatus {
        let timestamp = Utc::now();
        let started = Instant::now();

        let targets: BTreeSet<ServiceName> = services.iter().copied().collect();
        let probes = targets
            .iter()
            .map(|&service| async move { (service, self.probe(service).await) });
        let results: BTreeMap<ServiceName, ServiceHealth> =
            join_all(probes).await.into_iter().collect();

        let status = HealthStatus::new(timestamp, started.elapsed(), results);
        match status.status() {
            HealthState::Healthy => info!(
                services = status.services().len(),
                duration_ms = status.duration().as_millis() as u64,
                "Health check passed"
            ),
            state => warn!(
                state = %state,
                services = status.services().len(),
                duration_ms = status.duration().as_millis() as u64,
                "Health check reported problems"
            ),
        }

        *self.latest.write() = Some(status.clone());
        status
    }

    async fn probe(&self, service: ServiceName) -> ServiceHealth {
        let timeout = self.config.probe_timeout();
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.send_probe(service, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(HealthProbeError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };
        let health = classify(outcome, started.elapsed(), self.config.degraded_threshold());
        debug!(
            service = %service,
            state = %health.state,
            response_ms = health.response_time.as_millis() as u64,
            "Probe finished"
        );
        health
    }

    async fn send_probe(
        &self,
        service: ServiceName,
        timeout: Duration,
    ) -> Result<(), HealthProbeError> {
        let endpoint = self.endpoints.get(service).clone();
        let mut lease = self.pool.borrow().await?;
        let response = lease
            .call(probe::dummy_request(service, endpoint, timeout))
            .await?;
        probe::evaluate_dummy(&response)
    }

    /// The most recent round, from either `check_health` or the background task.
    pub fn latest(&self) -> Option<HealthStatus> {
        self.latest.read().clone()
    }

    /// Probe `services` every `interval` until the returned task is aborted.
    pub fn spawn(self: Arc<Self>, services: Vec<ServiceName>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = self.config.interval_secs,
                services = services.len(),
                "Health monitoring started"
            );
            loop {
                ticker.tick().await;
                if self.pool.is_closed() {
                    info!("Pool closed, health monitoring stopped");
                    break;
                }
                self.check_health(&services).await;
            }
        })
    }
}

/// Map one probe outcome to a service state.
///
/// Failures are `Unhealthy`; successes slower than `degraded_after` are
/// `Degraded`.
pub fn classify(
    outcome: Result<(), HealthProbeError>,
    elapsed: Duration,
    degraded_after: Duration,
) -> ServiceHealth {
    let (state, detail) = match outcome {
        Err(err) => (HealthState::Unhealthy, Some(err.to_string())),
        Ok(()) if elapsed > degraded_after => (
            HealthState::Degraded,
            Some(format!(
                "responded in {}ms (threshold {}ms)",
                elapsed.as_millis(),
                degraded_after.as_millis()
            )),
        ),
        Ok(()) => (HealthState::Healthy, None),
    };
    ServiceHealth {
        state,
        response_time: elapsed,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Environment;
    use crate::testkit::{self, fixtures, transport::{counting_factory, Reply}};
    use crate::port::SoapRequest;

    fn monitor(
        responder: impl Fn(&SoapRequest) -> Reply + Send + Sync + 'static,
        config: HealthConfig,
    ) -> HealthMonitor {
        let (factory, _) = counting_factory(responder);
        let pool = ConnectionPool::new(testkit::config::pool(4, 500), factory).unwrap();
        HealthMonitor::new(pool, Endpoints::for_environment(Environment::Testing), config)
    }

    fn ok() -> Reply {
        Reply::ok(fixtures::dummy_response("OK", "OK", "OK"))
    }

    #[test]
    fn classify_maps_outcomes() {
        let threshold = Duration::from_millis(100);
        assert_eq!(
            classify(Ok(()), Duration::from_millis(50), threshold).state,
            HealthState::Healthy
        );
        assert_eq!(
            classify(Ok(()), Duration::from_millis(150), threshold).state,
            HealthState::Degraded
        );
        let failed = classify(
            Err(HealthProbeError::Status(503)),
            Duration::from_millis(5),
            threshold,
        );
        assert_eq!(failed.state, HealthState::Unhealthy);
        assert!(failed.detail.unwrap().contains("503"));
    }

    #[tokio::test]
    async fn timeout_on_one_service_makes_round_unhealthy() {
        let config = testkit::config::health(&[], 300, 200);
        let monitor = monitor(
            |req| {
                if req.action.ends_with("FEXDummy") {
                    ok().after(Duration::from_secs(5))
                } else {
                    ok().after(Duration::from_millis(50))
                }
            },
            config,
        );

        let status = monitor
            .check_health(&[ServiceName::Wsfe, ServiceName::Wsfex])
            .await;

        assert_eq!(status.status(), HealthState::Unhealthy);
        assert_eq!(
            status.service(ServiceName::Wsfe).unwrap().state,
            HealthState::Healthy
        );
        let fex = status.service(ServiceName::Wsfex).unwrap();
        assert_eq!(fex.state, HealthState::Unhealthy);
        assert!(fex.detail.as_deref().unwrap().contains("timed out"));
        assert!(status.duration() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn slow_success_is_degraded() {
        let config = testkit::config::health(&[], 1_000, 100);
        let monitor = monitor(|_| ok().after(Duration::from_millis(200)), config);

        let status = monitor.check_health(&[ServiceName::Wsmtxca]).await;
        assert_eq!(status.status(), HealthState::Degraded);
    }

    #[tokio::test]
    async fn component_down_is_unhealthy() {
        let config = testkit::config::health(&[], 1_000, 500);
        let monitor = monitor(
            |_| Reply::ok(fixtures::dummy_response("OK", "DOWN", "OK")),
            config,
        );

        let status = monitor.check_health(&[ServiceName::Wsaa]).await;
        let wsaa = status.service(ServiceName::Wsaa).unwrap();
        assert_eq!(wsaa.state, HealthState::Unhealthy);
        assert!(wsaa.detail.as_deref().unwrap().contains("dbserver"));
    }

    #[tokio::test]
    async fn duplicates_are_probed_once_and_latest_is_kept() {
        let config = testkit::config::health(&[], 1_000, 500);
        let monitor = monitor(|_| ok(), config);
        assert!(monitor.latest().is_none());

        let status = monitor
            .check_health(&[ServiceName::Wsfe, ServiceName::Wsfe])
            .await;

        assert_eq!(status.services().len(), 1);
        assert!(status.is_healthy());
        assert_eq!(monitor.latest(), Some(status));
    }

    #[tokio::test]
    async fn empty_round_is_healthy() {
        let monitor = monitor(|_| ok(), testkit::config::health(&[], 1_000, 500));
        let status = monitor.check_health(&[]).await;
        assert!(status.is_healthy());
        assert!(status.services().is_empty());
    }

    #[tokio::test]
    async fn background_task_publishes_reports() {
        let config = testkit::config::health(&[], 1_000, 500);
        let monitor = Arc::new(monitor(|_| ok(), config));

        let handle = Arc::clone(&monitor).spawn(vec![ServiceName::Wsfe]);
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        let latest = monitor.latest().unwrap();
        assert!(latest.service(ServiceName::Wsfe).is_some());
    }
}
