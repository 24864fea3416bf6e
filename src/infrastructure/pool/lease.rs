//! Scoped checkout of one pooled connection.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, warn};

use super::state::{lock_or_recover, PooledConnection};
use super::PoolInner;
use crate::error::TransportError;
use crate::port::{SoapRequest, SoapResponse};

/// Exclusive use of one connection. Returned to the pool when dropped.
///
/// A connection whose last call failed, timed out or was cancelled is
/// discarded on drop instead of going back to the idle set.
pub struct ConnectionLease {
    connection: Option<PooledConnection>,
    pool: Arc<PoolInner>,
    broken: bool,
    // Released after the connection is back in the idle set.
    _permit: OwnedSemaphorePermit,
}

impl ConnectionLease {
    pub(super) fn new(
        mut connection: PooledConnection,
        pool: Arc<PoolInner>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        connection.in_use = true;
        pool.active.fetch_add(1, Ordering::SeqCst);
        Self {
            connection: Some(connection),
            pool,
            broken: false,
            _permit: permit,
        }
    }

    /// Borrowed connection, for inspection.
    pub fn connection(&self) -> Option<&PooledConnection> {
        self.connection.as_ref()
    }

    /// Identifier of the borrowed connection.
    pub fn id(&self) -> u64 {
        self.connection.as_ref().map_or(0, PooledConnection::id)
    }

    /// Send one request, bounded by the shorter of the request's own timeout
    /// and the pool's per-call timeout.
    ///
    /// # Errors
    ///
    /// Any transport failure; the connection is then discarded on release.
    pub async fn call(&mut self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(TransportError::Request("lease has no connection".into()));
        };

        // Stays set if this future is dropped mid-call.
        self.broken = true;

        let timeout = request.timeout.min(self.pool.config.per_call_timeout());
        let start = Instant::now();
        let outcome = match tokio::time::timeout(timeout, connection.transport.send(request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };
        let elapsed = start.elapsed();
        connection.last_used_at = Instant::now();

        let counters = &self.pool.counters;
        counters.requests.fetch_add(1, Ordering::Relaxed);
        lock_or_recover(&self.pool.latency).record(elapsed);

        match outcome {
            Ok(response) => {
                self.broken = false;
                Ok(response)
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    connection_id = connection.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "Pooled call failed, connection will be discarded"
                );
                Err(err)
            }
        }
    }

    /// Release without returning the connection to the idle set.
    pub fn discard(mut self) {
        self.broken = true;
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.pool.active.fetch_sub(1, Ordering::SeqCst);
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        connection.in_use = false;

        if self.broken || self.pool.is_closed() {
            self.pool.counters.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(connection_id = connection.id, "Connection discarded");
            return;
        }
        lock_or_recover(&self.pool.idle).push(connection);
    }
}

impl std::fmt::Debug for ConnectionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("connection", &self.connection)
            .field("broken", &self.broken)
            .finish()
    }
}
