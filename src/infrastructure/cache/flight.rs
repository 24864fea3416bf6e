//! In-flight refresh bookkeeping.
//!
//! One refresh per service runs as a detached task. Callers that arrive
//! while it runs attach to a shared handle on its result, so a cancelled
//! caller never strands the others.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::CacheInner;
use crate::domain::{AuthTicket, ServiceName};
use crate::error::AuthError;

pub(super) type RefreshOutcome = Result<AuthTicket, AuthError>;
pub(super) type RefreshHandle = Shared<BoxFuture<'static, RefreshOutcome>>;

/// A running refresh: the shared result plus a way to cancel it.
pub(super) struct Flight {
    pub(super) id: u64,
    pub(super) result: RefreshHandle,
    pub(super) abort: AbortHandle,
}

/// Owned by the refresh task. Publishes the outcome on completion and
/// clears the in-flight marker however the task ends (success, failure,
/// abort or panic).
pub(super) struct FlightGuard {
    inner: Arc<CacheInner>,
    service: ServiceName,
    id: u64,
    completed: bool,
}

impl FlightGuard {
    pub(super) fn new(inner: Arc<CacheInner>, service: ServiceName, id: u64) -> Self {
        Self {
            inner,
            service,
            id,
            completed: false,
        }
    }

    /// Store a successful ticket and release the marker in one critical section,
    /// so a new caller sees either the flight or the new ticket, never neither.
    pub(super) fn complete(mut self, outcome: &RefreshOutcome) {
        let counters = &self.inner.counters;
        counters.refreshes.fetch_add(1, Ordering::Relaxed);
        if outcome.is_err() {
            counters.refresh_failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut state = self.inner.state.lock();
        if let Ok(ticket) = outcome {
            if !state.closed {
                state.tickets.insert(self.service, ticket.clone());
            }
        }
        state.remove_flight(self.service, self.id);
        drop(state);

        self.completed = true;
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!(
            service = %self.service,
            flight_id = self.id,
            "Ticket refresh abandoned"
        );
        self.inner.state.lock().remove_flight(self.service, self.id);
    }
}

impl super::CacheState {
    pub(super) fn remove_flight(&mut self, service: ServiceName, id: u64) {
        if self.in_flight.get(&service).is_some_and(|f| f.id == id) {
            self.in_flight.remove(&service);
            debug!(service = %service, flight_id = id, "Refresh marker cleared");
        }
    }
}
