//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`] - Scripted [`Transport`](crate::port::Transport) and
//!   factories that count opened connections.
//! - [`issuer`] - A [`TicketIssuer`](crate::port::TicketIssuer) that counts calls
//!   and replays scripted outcomes.
//! - [`fixtures`] - Canned SOAP response bodies.
//! - [`credential`] - Throwaway signing credentials.
//! - [`config`] - Canonical test configurations with short timeouts.

pub mod config;
pub mod credential;
pub mod fixtures;
pub mod issuer;
pub mod transport;
