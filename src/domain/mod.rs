//! Transport-agnostic values: services, tickets, health and statistics.

pub mod credential;
pub mod health;
pub mod service;
pub mod stats;
pub mod ticket;

pub use credential::Credential;
pub use health::{HealthState, HealthStatus, ServiceHealth};
pub use service::{Endpoints, Environment, ServiceName};
pub use stats::{CacheStatistics, ConnectionPoolStatistics};
pub use ticket::AuthTicket;
