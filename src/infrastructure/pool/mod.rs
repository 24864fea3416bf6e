//! Bounded pool of reusable transport connections.
//!
//! # Capacity
//!
//! A semaphore with `max_size` permits gates every checkout. A borrower
//! holds a permit for as long as it holds its [`ConnectionLease`], so the
//! number of checked-out connections never exceeds `max_size`. Borrowers
//! beyond capacity wait up to `borrow_timeout` and then fail with
//! [`PoolError::Exhausted`].
//!
//! # Reuse
//!
//! Connections are opened lazily through the [`TransportFactory`] and kept
//! in a LIFO idle set between calls. Idle connections unused for longer than
//! `idle_timeout` are dropped at the next borrow. A connection whose call
//! failed is never returned to the idle set.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::ConnectionPoolStatistics;
use crate::error::{ConfigError, PoolError, Result};
use crate::infrastructure::config::PoolConfig;
use crate::port::{SoapRequest, SoapResponse, TransportFactory};

mod lease;
mod state;

pub use lease::ConnectionLease;
pub use state::PooledConnection;

use state::{lock_or_recover, LatencyTracker, SharedCounters};

pub(crate) struct PoolInner {
    config: PoolConfig,
    factory: TransportFactory,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<PooledConnection>>,
    latency: Mutex<LatencyTracker>,
    counters: SharedCounters,
    active: AtomicUsize,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl PoolInner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Most recently used idle connection that has not outlived `idle_timeout`.
    fn take_idle(&self) -> Option<PooledConnection> {
        let limit = self.config.idle_timeout();
        let mut idle = lock_or_recover(&self.idle);
        while let Some(connection) = idle.pop() {
            if connection.idle_longer_than(limit) {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                debug!(connection_id = connection.id, "Idle connection expired");
                continue;
            }
            return Some(connection);
        }
        None
    }
}

/// Cloneable handle to a shared connection pool.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Create a pool. No connection is opened until the first borrow.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid:
    /// - `max_size` must be > 0
    /// - `borrow_timeout_ms` must be > 0
    /// - `per_call_timeout_ms` must be > 0
    #[must_use = "returns Result that must be checked"]
    pub fn new(config: PoolConfig, factory: TransportFactory) -> Result<Self> {
        Self::validate_config(&config)?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(config.max_size)),
                idle: Mutex::new(Vec::with_capacity(config.max_size)),
                latency: Mutex::new(LatencyTracker::default()),
                counters: SharedCounters::new(),
                active: AtomicUsize::new(0),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                config,
                factory,
            }),
        })
    }

    fn validate_config(config: &PoolConfig) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        };

        if config.max_size == 0 {
            return Err(invalid("max_size", "must be > 0"));
        }
        if config.borrow_timeout_ms == 0 {
            return Err(invalid("borrow_timeout_ms", "must be > 0"));
        }
        if config.per_call_timeout_ms == 0 {
            return Err(invalid("per_call_timeout_ms", "must be > 0"));
        }
        Ok(())
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Check out a connection, waiting up to `borrow_timeout` for capacity.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] when no connection freed up in time,
    /// [`PoolError::Closed`] after [`close`](Self::close), and
    /// [`PoolError::Connect`] when a new connection could not be opened.
    pub async fn borrow(&self) -> std::result::Result<ConnectionLease, PoolError> {
        let inner = &self.inner;
        if inner.is_closed() {
            return Err(PoolError::Closed);
        }

        let started = Instant::now();
        let wait = inner.config.borrow_timeout();
        let permit = match tokio::time::timeout(wait, Arc::clone(&inner.permits).acquire_owned())
            .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(PoolError::Closed),
            Err(_) => {
                let waited_ms = started.elapsed().as_millis() as u64;
                warn!(
                    waited_ms,
                    max_size = inner.config.max_size,
                    "Connection pool exhausted"
                );
                return Err(PoolError::Exhausted {
                    waited_ms,
                    max_size: inner.config.max_size,
                });
            }
        };

        if inner.is_closed() {
            return Err(PoolError::Closed);
        }

        let connection = match inner.take_idle() {
            Some(connection) => {
                inner.counters.reused.fetch_add(1, Ordering::Relaxed);
                connection
            }
            None => {
                let id = inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let transport = (inner.factory)(id)?;
                inner.counters.created.fetch_add(1, Ordering::Relaxed);
                debug!(connection_id = id, "Opened pooled connection");
                PooledConnection::new(id, transport)
            }
        };

        Ok(ConnectionLease::new(connection, Arc::clone(inner), permit))
    }

    /// Return a lease explicitly. Equivalent to dropping it.
    pub fn release(&self, lease: ConnectionLease) {
        drop(lease);
    }

    /// Borrow, send one request and release, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Pool errors from the borrow or transport errors from the call.
    pub async fn execute(&self, request: SoapRequest) -> Result<SoapResponse> {
        let mut lease = self.borrow().await?;
        Ok(lease.call(request).await?)
    }

    /// Point-in-time snapshot of occupancy, counters and mean latency.
    pub fn statistics(&self) -> ConnectionPoolStatistics {
        let inner = &self.inner;
        let c = &inner.counters;
        ConnectionPoolStatistics {
            active_connections: inner.active.load(Ordering::SeqCst),
            idle_connections: lock_or_recover(&inner.idle).len(),
            max_size: inner.config.max_size,
            total_requests_handled: c.requests.load(Ordering::Relaxed),
            failed_requests: c.failed.load(Ordering::Relaxed),
            average_response_time_ms: lock_or_recover(&inner.latency).mean_ms(),
            connections_created: c.created.load(Ordering::Relaxed),
            connections_reused: c.reused.load(Ordering::Relaxed),
            connections_discarded: c.discarded.load(Ordering::Relaxed),
        }
    }

    /// True after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Fail pending and future borrows and drop idle connections.
    ///
    /// Outstanding leases stay usable; their connections are discarded on release.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.permits.close();
        let dropped = {
            let mut idle = lock_or_recover(&self.inner.idle);
            let n = idle.len();
            idle.clear();
            n
        };
        self.inner
            .counters
            .discarded
            .fetch_add(dropped as u64, Ordering::Relaxed);
        info!(
            idle_dropped = dropped,
            active = self.inner.active.load(Ordering::SeqCst),
            "Connection pool closed"
        );
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("max_size", &self.inner.config.max_size)
            .field("active", &self.inner.active.load(Ordering::SeqCst))
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}
