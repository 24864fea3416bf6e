//! Composition root: one explicitly owned object holding the ticket cache,
//! the connection pool and the health monitor.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::adapter::{Ed25519Signer, HttpTransport, WsaaTicketIssuer};
use crate::domain::{
    AuthTicket, CacheStatistics, ConnectionPoolStatistics, Credential, Endpoints, HealthStatus,
    ServiceName,
};
use crate::error::Result;
use crate::infrastructure::cache::{TicketCache, TicketCacheConfig};
use crate::infrastructure::config::Settings;
use crate::infrastructure::health::HealthMonitor;
use crate::infrastructure::pool::ConnectionPool;
use crate::port::{RequestSigner, SoapRequest, SoapResponse, TicketIssuer, TransportFactory};

/// Client for the platform's ticketed services.
///
/// Callers own it and are responsible for its lifetime; dropping it (or
/// calling [`shutdown`](Self::shutdown)) cancels running refreshes, stops
/// monitoring and closes the pool.
pub struct AfipClient {
    settings: Settings,
    endpoints: Endpoints,
    tickets: Arc<TicketCache>,
    pool: ConnectionPool,
    health: Arc<HealthMonitor>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl AfipClient {
    /// Wire HTTP transports, the login issuer, cache, pool and monitor.
    ///
    /// The login call uses its own transport, outside the pool, so a
    /// saturated pool never blocks a refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint override is invalid, the pool
    /// configuration is rejected, or the HTTP client cannot be built.
    pub fn new(settings: Settings, credential: Credential) -> Result<Self> {
        Self::with_signer(settings, credential, Arc::new(Ed25519Signer::new()))
    }

    /// Same wiring as [`new`](Self::new) with a caller-supplied login signer.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_signer(
        settings: Settings,
        credential: Credential,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self> {
        let endpoints = settings.endpoints()?;
        let connect_timeout = settings.pool.connect_timeout();

        let login_transport = HttpTransport::new(0, connect_timeout)?;
        let issuer = WsaaTicketIssuer::new(
            endpoints.get(ServiceName::Wsaa).clone(),
            credential,
            signer,
            Arc::new(login_transport),
        )
        .with_request_window(settings.auth.request_window())
        .with_timeout(settings.auth.login_timeout());

        Self::from_parts(
            settings,
            Arc::new(issuer),
            HttpTransport::factory(connect_timeout),
        )
    }

    /// Wire the client around any issuer and transport factory.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint override is invalid or the pool
    /// configuration is rejected.
    pub fn from_parts(
        settings: Settings,
        issuer: Arc<dyn TicketIssuer>,
        factory: TransportFactory,
    ) -> Result<Self> {
        let endpoints = settings.endpoints()?;
        let tickets = Arc::new(TicketCache::new(
            issuer,
            TicketCacheConfig::from(&settings.auth),
        ));
        let pool = ConnectionPool::new(settings.pool.clone(), factory)?;
        let health = Arc::new(HealthMonitor::new(
            pool.clone(),
            endpoints.clone(),
            settings.health.clone(),
        ));

        info!(
            environment = %settings.environment,
            pool_size = settings.pool.max_size,
            "AFIP client ready"
        );

        Ok(Self {
            settings,
            endpoints,
            tickets,
            pool,
            health,
            monitor: Mutex::new(None),
        })
    }

    /// Settings the client was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolved endpoint addresses, overrides applied.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// A ticket for `service` outside the configured expiry window.
    ///
    /// # Errors
    ///
    /// Authentication errors from the cache.
    pub async fn ticket(&self, service: ServiceName) -> Result<AuthTicket> {
        Ok(self.tickets.get_valid_ticket(service).await?)
    }

    /// Call `action` on `service` with a body built from a valid ticket.
    ///
    /// Only the ticket is provided here; the payload schema belongs to the
    /// caller. The response is returned as received, faults included.
    ///
    /// # Errors
    ///
    /// Authentication, capacity or transport errors, each with its own variant.
    pub async fn invoke<F>(
        &self,
        service: ServiceName,
        action: &str,
        build_body: F,
    ) -> Result<SoapResponse>
    where
        F: FnOnce(&AuthTicket) -> String,
    {
        let ticket = self.ticket(service).await?;
        let request = SoapRequest {
            endpoint: self.endpoints.get(service).clone(),
            action: action.to_string(),
            body: build_body(&ticket),
            timeout: self.settings.pool.per_call_timeout(),
        };
        self.pool.execute(request).await
    }

    /// Probe `services` now.
    pub async fn check_health(&self, services: &[ServiceName]) -> HealthStatus {
        self.health.check_health(services).await
    }

    /// Start background probing of the configured services. No-op if running.
    pub fn start_monitoring(&self) {
        let mut monitor = self.monitor.lock();
        if monitor.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let services = self.settings.health.services.clone();
        *monitor = Some(Arc::clone(&self.health).spawn(services));
    }

    /// The most recent health round, on demand or background.
    pub fn latest_health(&self) -> Option<HealthStatus> {
        self.health.latest()
    }

    /// Ticket cache counters.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.tickets.statistics()
    }

    /// Connection pool snapshot.
    pub fn pool_statistics(&self) -> ConnectionPoolStatistics {
        self.pool.statistics()
    }

    pub fn tickets(&self) -> &TicketCache {
        &self.tickets
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Stop monitoring, cancel refreshes and close the pool. Idempotent.
    pub fn shutdown(&self) {
        if let Some(handle) = self.monitor.lock().take() {
            handle.abort();
        }
        self.tickets.shutdown();
        self.pool.close();
    }
}

impl Drop for AfipClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
