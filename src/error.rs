use thiserror::Error;

use crate::domain::service::ServiceName;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Ticket acquisition errors.
///
/// `Clone` because every caller waiting on one refresh receives the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("credential error: {0}")]
    Credential(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("login rejected for {service}: {reason}")]
    RemoteAuth { service: ServiceName, reason: String },

    #[error("malformed login response: {0}")]
    Parse(String),

    #[error("login for {service} timed out after {timeout_ms}ms")]
    Timeout { service: ServiceName, timeout_ms: u64 },

    #[error("{0} does not use access tickets")]
    NotTicketed(ServiceName),

    #[error("ticket cache is shut down")]
    Shutdown,
}

/// Connection pool errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("no connection available after {waited_ms}ms (max_size {max_size})")]
    Exhausted { waited_ms: u64, max_size: usize },

    #[error("connection pool is closed")]
    Closed,

    #[error("failed to open connection: {0}")]
    Connect(String),
}

/// Transport-level failures. A connection that returns one of these is discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Per-service probe failure. Converted into an `Unhealthy` status, never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthProbeError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("probe timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("SOAP fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("{component} reported {status}")]
    ComponentDown { component: String, status: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the failure is about authentication rather than capacity or transport.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// True when the pool had no capacity (or was closed).
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Pool(PoolError::Exhausted { .. } | PoolError::Closed))
    }
}
