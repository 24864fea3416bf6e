//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!        ┌──────────────────────────────────────────┐
//!        │   TicketCache · ConnectionPool · Health  │
//!        └──────┬──────────────┬──────────────┬─────┘
//!               ▼              ▼              ▼
//!        ┌────────────┐ ┌─────────────┐ ┌───────────┐
//!        │TicketIssuer│ │RequestSigner│ │ Transport │
//!        └────────────┘ └─────────────┘ └───────────┘
//! ```
//!
//! - [`RequestSigner`] - turns a login request document into a signed blob
//! - [`TicketIssuer`] - obtains a fresh [`AuthTicket`](crate::domain::AuthTicket)
//! - [`Transport`] - one reusable channel to the remote platform

mod issuer;
mod signer;
mod transport;

pub use issuer::TicketIssuer;
pub use signer::RequestSigner;
pub use transport::{SoapRequest, SoapResponse, Transport, TransportFactory};
