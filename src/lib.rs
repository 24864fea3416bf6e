//! afip-client - Authentication tickets and pooled transport for the AFIP
//! SOAP web services.
//!
//! Every business service (electronic invoicing, export invoicing, ...)
//! requires a short-lived access ticket obtained from the login service.
//! This crate manages those tickets and the connections used to call the
//! services.
//!
//! # Architecture
//!
//! - **`domain`** - Values: service names, tickets, health reports, statistics
//! - **`port`** - Seams: `TicketIssuer`, `RequestSigner`, `Transport`
//! - **`adapter`** - Wire implementations: reqwest transport, Ed25519 signer,
//!   `loginCms` client, status probes
//! - **`infrastructure`** - `TicketCache`, `ConnectionPool`, `HealthMonitor`
//!   and the `AfipClient` that owns them
//!
//! # Features
//!
//! - `testkit` - Expose test doubles and fixtures to integration tests
//!
//! # Example
//!
//! ```no_run
//! use afip_client::{AfipClient, Credential, ServiceName, Settings};
//!
//! # async fn run(key: Vec<u8>, cert: Vec<u8>) -> afip_client::Result<()> {
//! let settings = Settings::load("afip.toml")?;
//! settings.logging.init();
//!
//! let client = AfipClient::new(settings, Credential::new(key, cert))?;
//! let response = client
//!     .invoke(ServiceName::Wsfe, "http://ar.gov.afip.dif.FEV1/FEParamGetTiposCbte", |ticket| {
//!         format!("<Token>{}</Token>", ticket.token())
//!     })
//!     .await?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use domain::{
    AuthTicket, CacheStatistics, ConnectionPoolStatistics, Credential, Endpoints, Environment,
    HealthState, HealthStatus, ServiceHealth, ServiceName,
};
pub use error::{Error, Result};
pub use infrastructure::cache::TicketCache;
pub use infrastructure::client::AfipClient;
pub use infrastructure::config::Settings;
pub use infrastructure::health::HealthMonitor;
pub use infrastructure::pool::{ConnectionLease, ConnectionPool};
