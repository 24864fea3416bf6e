//! Concrete implementations of the ports: HTTP transport, signer, login
//! service client and status probes.

pub mod http;
pub mod probe;
pub mod signer;
pub mod soap;
pub mod wsaa;

pub use http::HttpTransport;
pub use signer::Ed25519Signer;
pub use wsaa::WsaaTicketIssuer;
