//! Infrastructure configuration modules.

pub mod auth;
pub mod health;
pub mod logging;
pub mod pool;
pub mod settings;

pub use auth::AuthConfig;
pub use health::HealthConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pool::PoolConfig;
pub use settings::{EndpointOverrides, Settings};
