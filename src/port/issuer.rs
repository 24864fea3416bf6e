use async_trait::async_trait;

use crate::domain::{AuthTicket, ServiceName};
use crate::error::AuthError;

/// Source of fresh access tickets.
///
/// Every call is a network round trip; the ticket cache guarantees at most
/// one concurrent call per service.
#[async_trait]
pub trait TicketIssuer: Send + Sync {
    /// Obtain a new ticket for `service`.
    ///
    /// The returned ticket's expiry comes from the remote response, not the
    /// local clock.
    async fn issue(&self, service: ServiceName) -> Result<AuthTicket, AuthError>;
}
