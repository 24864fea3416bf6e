//! Scripted ticket issuer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{AuthTicket, ServiceName};
use crate::error::AuthError;
use crate::port::TicketIssuer;

/// What one `issue` call produces.
#[derive(Debug, Clone)]
pub enum Issued {
    /// A ticket valid for the given lifetime from the moment of issue.
    Ticket(Duration),
    Fail(AuthError),
}

/// Counts calls and replays queued outcomes, falling back to a default
/// outcome once the queue is empty.
pub struct CountingIssuer {
    calls: AtomicUsize,
    delay: Duration,
    queue: Mutex<VecDeque<Issued>>,
    default: Issued,
}

impl CountingIssuer {
    /// Issues 12 hour tickets.
    pub fn new() -> Self {
        Self::with_default(Issued::Ticket(Duration::from_secs(12 * 3600)))
    }

    /// Fails every call with `err`.
    pub fn failing(err: AuthError) -> Self {
        Self::with_default(Issued::Fail(err))
    }

    pub fn with_default(default: Issued) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            queue: Mutex::new(VecDeque::new()),
            default,
        }
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue an outcome for the next unscripted call.
    pub fn then(self, outcome: Issued) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketIssuer for CountingIssuer {
    async fn issue(&self, service: ServiceName) -> Result<AuthTicket, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        match outcome {
            Issued::Ticket(lifetime) => {
                let now = Utc::now();
                let expires = now
                    + chrono::Duration::from_std(lifetime)
                        .map_err(|e| AuthError::Parse(e.to_string()))?;
                AuthTicket::new(
                    service,
                    format!("token-{n}"),
                    format!("sign-{n}"),
                    now - chrono::Duration::seconds(1),
                    expires,
                )
            }
            Issued::Fail(err) => Err(err),
        }
    }
}
