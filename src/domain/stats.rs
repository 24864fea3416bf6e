//! Read-only statistics snapshots exposed to callers.

use serde::Serialize;

/// Ticket cache counters. Monotonic for the life of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    /// Requests served from a fresh cached ticket.
    pub hits: u64,
    /// Requests that found no fresh ticket (refresh leaders and waiters).
    pub misses: u64,
    /// Completed calls to the ticket issuer.
    pub refreshes: u64,
    /// Issuer calls that failed.
    pub refresh_failures: u64,
    /// Requests answered with a still-valid ticket after a failed refresh.
    pub stale_served: u64,
}

impl CacheStatistics {
    /// `hits / (hits + misses)`, zero before the first request.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Connection pool snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConnectionPoolStatistics {
    /// Connections currently checked out.
    pub active_connections: usize,
    /// Connections parked and ready for reuse.
    pub idle_connections: usize,
    /// Configured capacity.
    pub max_size: usize,
    /// Calls completed through a lease, successful or not.
    pub total_requests_handled: u64,
    /// Calls that ended in a transport failure.
    pub failed_requests: u64,
    /// Running mean latency over completed calls.
    pub average_response_time_ms: f64,
    /// Connections opened through the transport factory.
    pub connections_created: u64,
    /// Borrows served from the idle set.
    pub connections_reused: u64,
    /// Connections dropped after a failure, cancellation, expiry or explicit discard.
    pub connections_discarded: u64,
}

impl ConnectionPoolStatistics {
    /// Share of borrows satisfied by reusing an existing connection.
    ///
    /// `reused / (reused + created)`, zero before the first borrow.
    #[must_use]
    pub fn pool_efficiency(&self) -> f64 {
        let borrows = self.connections_reused + self.connections_created;
        if borrows == 0 {
            0.0
        } else {
            self.connections_reused as f64 / borrows as f64
        }
    }

    /// Fraction of capacity currently checked out.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.active_connections as f64 / self.max_size as f64
        }
    }
}
