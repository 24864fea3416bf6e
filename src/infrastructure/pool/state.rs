//! Connection pool internal state types.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::port::Transport;

/// Counters updated atomically on borrow, release and call completion.
pub(super) struct SharedCounters {
    /// Calls completed through a lease.
    pub(super) requests: AtomicU64,
    /// Calls that ended in a transport error or timeout.
    pub(super) failed: AtomicU64,
    /// Connections opened by the factory.
    pub(super) created: AtomicU64,
    /// Borrows served from the idle set.
    pub(super) reused: AtomicU64,
    /// Connections dropped instead of returned to idle.
    pub(super) discarded: AtomicU64,
}

impl SharedCounters {
    pub(super) fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }
}

/// One reusable channel. Owned by the pool's idle set or by exactly one lease.
pub struct PooledConnection {
    /// Pool-assigned identifier, unique for the life of the pool.
    pub(super) id: u64,
    /// When the transport was opened.
    pub(super) created_at: Instant,
    /// When the connection was last borrowed or returned.
    pub(super) last_used_at: Instant,
    /// Whether a lease currently holds the connection.
    pub(super) in_use: bool,
    /// The underlying channel.
    pub(super) transport: Box<dyn Transport>,
}

impl PooledConnection {
    pub(super) fn new(id: u64, transport: Box<dyn Transport>) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_used_at: now,
            in_use: false,
            transport,
        }
    }

    /// Pool-assigned identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// When the transport was opened.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the connection was last borrowed or returned.
    #[must_use]
    pub fn last_used_at(&self) -> Instant {
        self.last_used_at
    }

    /// Whether a lease currently holds the connection.
    #[must_use]
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// True once the connection has sat unused for more than `limit`.
    pub(super) fn idle_longer_than(&self, limit: Duration) -> bool {
        self.last_used_at.elapsed() > limit
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("age", &self.created_at.elapsed())
            .field("in_use", &self.in_use)
            .finish_non_exhaustive()
    }
}

/// Running mean of call latency.
#[derive(Debug, Default)]
pub(super) struct LatencyTracker {
    /// Number of recorded calls.
    samples: u64,
    /// Mean latency in milliseconds over `samples`.
    mean_ms: f64,
}

impl LatencyTracker {
    /// Fold one call's latency into the mean.
    pub(super) fn record(&mut self, elapsed: Duration) {
        self.samples += 1;
        let sample = elapsed.as_secs_f64() * 1_000.0;
        self.mean_ms += (sample - self.mean_ms) / self.samples as f64;
    }

    pub(super) fn mean_ms(&self) -> f64 {
        self.mean_ms
    }
}

/// Lock a mutex, recovering from poisoning if necessary.
///
/// If a thread panicked while holding the lock, logs a warning and recovers
/// the data. This keeps the pool operational while surfacing the issue.
pub(super) fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Mutex poisoned (previous holder panicked), recovering");
            poisoned.into_inner()
        }
    }
}
