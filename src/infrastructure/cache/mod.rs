//! Per-service ticket cache with single-flight refresh.
//!
//! # Lookup
//!
//! A request for service `S` is served from the cache when the stored
//! ticket is valid and not inside the expiry window. Otherwise the request
//! joins the in-flight refresh for `S`, starting one if none exists. At most
//! one issuer call per service is ever in progress; every caller attached
//! to it sees the same ticket or the same error.
//!
//! # Failure
//!
//! A failed refresh leaves the stored ticket untouched. With
//! `fallback_to_stale` enabled, a stored ticket that is still valid is
//! served instead of the error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::domain::{AuthTicket, CacheStatistics, ServiceName};
use crate::error::AuthError;
use crate::infrastructure::config::AuthConfig;
use crate::port::TicketIssuer;

mod flight;

use flight::{Flight, FlightGuard, RefreshHandle, RefreshOutcome};

/// Cache behaviour knobs.
#[derive(Debug, Clone)]
pub struct TicketCacheConfig {
    /// Default refresh window; tickets expiring sooner are refreshed.
    pub expiry_window: Duration,
    /// Upper bound on one issuer call.
    pub login_timeout: Duration,
    pub fallback_to_stale: bool,
}

impl Default for TicketCacheConfig {
    fn default() -> Self {
        (&AuthConfig::default()).into()
    }
}

impl From<&AuthConfig> for TicketCacheConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            expiry_window: config.expiry_window(),
            login_timeout: config.login_timeout(),
            fallback_to_stale: config.fallback_to_stale,
        }
    }
}

#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
    stale_served: AtomicU64,
}

#[derive(Default)]
struct CacheState {
    tickets: HashMap<ServiceName, AuthTicket>,
    in_flight: HashMap<ServiceName, Flight>,
    next_flight_id: u64,
    closed: bool,
}

pub(crate) struct CacheInner {
    state: Mutex<CacheState>,
    counters: CacheCounters,
}

/// Process-lifetime ticket store. Cheap to share behind an `Arc`.
pub struct TicketCache {
    issuer: Arc<dyn TicketIssuer>,
    config: TicketCacheConfig,
    inner: Arc<CacheInner>,
}

impl TicketCache {
    /// Empty cache around `issuer`. Nothing is fetched until the first request.
    pub fn new(issuer: Arc<dyn TicketIssuer>, config: TicketCacheConfig) -> Self {
        Self {
            issuer,
            config,
            inner: Arc::new(CacheInner {
                state: Mutex::new(CacheState::default()),
                counters: CacheCounters::default(),
            }),
        }
    }

    /// Configuration the cache was built with.
    pub fn config(&self) -> &TicketCacheConfig {
        &self.config
    }

    /// A ticket for `service` that will not expire within the default window.
    ///
    /// # Errors
    ///
    /// Returns the refresh error when no usable ticket could be produced;
    /// [`AuthError::NotTicketed`] for the login service itself and
    /// [`AuthError::Shutdown`] after [`shutdown`](Self::shutdown).
    pub async fn get_valid_ticket(&self, service: ServiceName) -> Result<AuthTicket, AuthError> {
        self.get_valid_ticket_within(service, self.config.expiry_window)
            .await
    }

    /// Like [`get_valid_ticket`](Self::get_valid_ticket) with a caller-chosen window.
    pub async fn get_valid_ticket_within(
        &self,
        service: ServiceName,
        window: Duration,
    ) -> Result<AuthTicket, AuthError> {
        if service.ticket_id().is_none() {
            return Err(AuthError::NotTicketed(service));
        }

        let refresh = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(AuthError::Shutdown);
            }

            if let Some(ticket) = state.tickets.get(&service) {
                if ticket.is_fresh_at(Utc::now(), window) {
                    self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(service = %service, "Ticket cache hit");
                    return Ok(ticket.clone());
                }
            }

            self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
            match state.in_flight.get(&service) {
                Some(flight) => {
                    debug!(service = %service, flight_id = flight.id, "Joining in-flight refresh");
                    flight.result.clone()
                }
                None => self.start_refresh(service, &mut state),
            }
        };

        match refresh.await {
            Ok(ticket) => Ok(ticket),
            Err(err) => self.fallback(service, err),
        }
    }

    /// Spawn the refresh task and register it. Called with the state lock held.
    fn start_refresh(&self, service: ServiceName, state: &mut CacheState) -> RefreshHandle {
        state.next_flight_id += 1;
        let id = state.next_flight_id;

        let issuer = Arc::clone(&self.issuer);
        let guard = FlightGuard::new(Arc::clone(&self.inner), service, id);
        let timeout = self.config.login_timeout;

        debug!(service = %service, flight_id = id, "Starting ticket refresh");

        let task = tokio::spawn(async move {
            let outcome: RefreshOutcome =
                match tokio::time::timeout(timeout, issuer.issue(service)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AuthError::Timeout {
                        service,
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
            guard.complete(&outcome);
            outcome
        });

        let abort = task.abort_handle();
        let result = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(join) if join.is_cancelled() => Err(AuthError::Shutdown),
                Err(join) => Err(AuthError::RemoteAuth {
                    service,
                    reason: format!("refresh task failed: {join}"),
                }),
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            service,
            Flight {
                id,
                result: result.clone(),
                abort,
            },
        );
        result
    }

    fn fallback(&self, service: ServiceName, err: AuthError) -> Result<AuthTicket, AuthError> {
        if !self.config.fallback_to_stale || err == AuthError::Shutdown {
            return Err(err);
        }

        let state = self.inner.state.lock();
        match state.tickets.get(&service) {
            Some(ticket) if ticket.is_valid_at(Utc::now()) => {
                self.inner.counters.stale_served.fetch_add(1, Ordering::Relaxed);
                warn!(
                    service = %service,
                    error = %err,
                    expires_at = %ticket.expires_at(),
                    "Ticket refresh failed, serving cached ticket"
                );
                Ok(ticket.clone())
            }
            _ => Err(err),
        }
    }

    /// The stored ticket for `service`, fresh or not. Does not touch statistics.
    pub fn cached(&self, service: ServiceName) -> Option<AuthTicket> {
        self.inner.state.lock().tickets.get(&service).cloned()
    }

    /// Drop the stored ticket (e.g. after the remote rejected it) so the next
    /// request refreshes. Returns whether a ticket was present.
    pub fn invalidate(&self, service: ServiceName) -> bool {
        let removed = self.inner.state.lock().tickets.remove(&service).is_some();
        if removed {
            info!(service = %service, "Cached ticket invalidated");
        }
        removed
    }

    /// Snapshot of hit, miss and refresh counters.
    pub fn statistics(&self) -> CacheStatistics {
        let c = &self.inner.counters;
        CacheStatistics {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            refreshes: c.refreshes.load(Ordering::Relaxed),
            refresh_failures: c.refresh_failures.load(Ordering::Relaxed),
            stale_served: c.stale_served.load(Ordering::Relaxed),
        }
    }

    /// Number of refreshes currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }

    /// Cancel running refreshes and refuse further requests.
    ///
    /// Callers waiting on a cancelled refresh receive [`AuthError::Shutdown`].
    pub fn shutdown(&self) {
        let aborts: Vec<_> = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.tickets.clear();
            state.in_flight.drain().map(|(_, f)| f.abort).collect()
        };
        info!(cancelled = aborts.len(), "Ticket cache shut down");
        for abort in aborts {
            abort.abort();
        }
    }
}
