//! Access tickets issued by the login service.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::service::ServiceName;
use crate::error::AuthError;

/// A short-lived token/sign pair authorizing calls to one service.
///
/// Immutable once built. A refresh produces a new ticket that replaces the
/// old one; nothing edits a ticket in place.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTicket {
    /// Opaque token issued by the login service.
    token: String,
    /// Signature over the token, sent alongside it.
    sign: String,
    /// Issue time reported by the login service.
    generated_at: DateTime<Utc>,
    /// Instant after which the remote rejects the ticket.
    expires_at: DateTime<Utc>,
    /// Service the ticket authorizes.
    service: ServiceName,
}

impl AuthTicket {
    /// Build a ticket, enforcing `generated_at < expires_at` and non-empty credentials.
    pub fn new(
        service: ServiceName,
        token: impl Into<String>,
        sign: impl Into<String>,
        generated_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let token = token.into();
        let sign = sign.into();
        if token.trim().is_empty() {
            return Err(AuthError::Parse("ticket token is empty".into()));
        }
        if sign.trim().is_empty() {
            return Err(AuthError::Parse("ticket sign is empty".into()));
        }
        if generated_at >= expires_at {
            return Err(AuthError::Parse(format!(
                "ticket generation time {generated_at} is not before expiration {expires_at}"
            )));
        }
        Ok(Self {
            token,
            sign,
            generated_at,
            expires_at,
            service,
        })
    }

    /// Opaque token; never log it.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Signature paired with the token; never log it.
    pub fn sign(&self) -> &str {
        &self.sign
    }

    /// Issue time.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Expiry time.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Service the ticket authorizes.
    pub fn service(&self) -> ServiceName {
        self.service
    }

    /// `now < expires_at`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// `now + window >= expires_at`.
    #[must_use]
    pub fn will_expire_soon_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match chrono::Duration::from_std(window) {
            Ok(window) => now
                .checked_add_signed(window)
                .map_or(true, |deadline| deadline >= self.expires_at),
            // A window too large to represent covers any expiry.
            Err(_) => true,
        }
    }

    /// Valid and not inside the refresh window; the cache serves only fresh tickets.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.is_valid_at(now) && !self.will_expire_soon_at(now, window)
    }

    /// [`is_valid_at`](Self::is_valid_at) against the current time.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// [`will_expire_soon_at`](Self::will_expire_soon_at) against the current time.
    #[must_use]
    pub fn will_expire_soon(&self, window: Duration) -> bool {
        self.will_expire_soon_at(Utc::now(), window)
    }

    /// Time left before expiry, zero once expired.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or_default()
    }
}

// Token and sign are bearer credentials; keep them out of logs.
impl fmt::Debug for AuthTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTicket")
            .field("service", &self.service)
            .field("token", &"[REDACTED]")
            .field("sign", &"[REDACTED]")
            .field("generated_at", &self.generated_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
