//! Infrastructure layer.
//!
//! Stateful services built on the ports, plus configuration.
//!
//! # Submodules
//!
//! - [`cache`] - Per-service ticket cache with single-flight refresh
//! - [`client`] - Composition root owning cache, pool and monitor
//! - [`config`] - Configuration loading and validation
//! - [`health`] - Concurrent status probing and aggregation
//! - [`pool`] - Bounded pool of reusable transport connections

pub mod cache;
pub mod client;
pub mod config;
pub mod health;
pub mod pool;
