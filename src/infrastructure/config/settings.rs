//! Top-level configuration loading and validation.
//!
//! Settings come from a TOML file. `AFIP_ENVIRONMENT` (also read from a
//! `.env` file) overrides the configured environment.
//!
//! ```toml
//! environment = "production"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [auth]
//! expiry_window_secs = 600
//!
//! [pool]
//! max_size = 8
//!
//! [health]
//! degraded_latency_threshold_ms = 1500
//!
//! [endpoints]
//! wsfe = "https://wswhomo.afip.gov.ar/wsfev1/service.asmx"
//! ```

use std::path::Path;

use serde::Deserialize;
use url::Url;

use super::auth::AuthConfig;
use super::health::HealthConfig;
use super::logging::LoggingConfig;
use super::pool::PoolConfig;
use crate::domain::{Endpoints, Environment, ServiceName};
use crate::error::{ConfigError, Result};

pub const ENVIRONMENT_VAR: &str = "AFIP_ENVIRONMENT";

/// Upper bound for `auth.request_window_secs` (one day).
pub const MAX_REQUEST_WINDOW_SECS: u64 = 86_400;

/// Optional per-service endpoint overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointOverrides {
    #[serde(default)]
    pub wsaa: Option<String>,
    #[serde(default)]
    pub wsfe: Option<String>,
    #[serde(default)]
    pub wsfex: Option<String>,
    #[serde(default)]
    pub wsmtxca: Option<String>,
}

impl EndpointOverrides {
    fn get(&self, service: ServiceName) -> Option<&str> {
        match service {
            ServiceName::Wsaa => self.wsaa.as_deref(),
            ServiceName::Wsfe => self.wsfe.as_deref(),
            ServiceName::Wsfex => self.wsfex.as_deref(),
            ServiceName::Wsmtxca => self.wsmtxca.as_deref(),
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Selects default endpoint addresses.
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Ticket cache and login settings.
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

impl Settings {
    /// Parse configuration from TOML content and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, `AFIP_ENVIRONMENT` holds an
    /// unknown value, or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Ok(raw) = std::env::var(ENVIRONMENT_VAR) {
            settings.environment = raw.parse().map_err(|reason| ConfigError::InvalidValue {
                field: ENVIRONMENT_VAR,
                reason,
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a TOML file, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`parse_toml`](Self::parse_toml) fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Endpoint addresses for the configured environment, with overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an override that is not a URL.
    pub fn endpoints(&self) -> Result<Endpoints> {
        let mut endpoints = Endpoints::for_environment(self.environment);
        for service in ServiceName::ALL {
            if let Some(raw) = self.endpoints.get(service) {
                let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
                    field: endpoint_field(service),
                    reason: e.to_string(),
                })?;
                endpoints = endpoints.with(service, url);
            }
        }
        Ok(endpoints)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        };

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "logging.level",
            }
            .into());
        }
        if self.auth.login_timeout_ms == 0 {
            return Err(invalid("login_timeout_ms", "must be > 0"));
        }
        if self.auth.request_window_secs == 0 {
            return Err(invalid("request_window_secs", "must be > 0"));
        }
        if self.auth.request_window_secs > MAX_REQUEST_WINDOW_SECS {
            return Err(invalid("request_window_secs", "must be <= 86400"));
        }
        if self.pool.max_size == 0 {
            return Err(invalid("max_size", "must be > 0"));
        }
        if self.pool.borrow_timeout_ms == 0 {
            return Err(invalid("borrow_timeout_ms", "must be > 0"));
        }
        if self.pool.per_call_timeout_ms == 0 {
            return Err(invalid("per_call_timeout_ms", "must be > 0"));
        }
        if self.pool.connect_timeout_ms == 0 {
            return Err(invalid("connect_timeout_ms", "must be > 0"));
        }
        if self.health.probe_timeout_ms == 0 {
            return Err(invalid("probe_timeout_ms", "must be > 0"));
        }
        if self.health.degraded_latency_threshold_ms >= self.health.probe_timeout_ms {
            return Err(invalid(
                "degraded_latency_threshold_ms",
                "must be < probe_timeout_ms",
            ));
        }
        if self.health.interval_secs == 0 {
            return Err(invalid("interval_secs", "must be > 0"));
        }

        self.endpoints()?;
        Ok(())
    }
}

const fn endpoint_field(service: ServiceName) -> &'static str {
    match service {
        ServiceName::Wsaa => "endpoints.wsaa",
        ServiceName::Wsfe => "endpoints.wsfe",
        ServiceName::Wsfex => "endpoints.wsfex",
        ServiceName::Wsmtxca => "endpoints.wsmtxca",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn invalid_field(result: Result<Settings>) -> &'static str {
        match result {
            Err(Error::Config(ConfigError::InvalidValue { field, .. })) => field,
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_uses_defaults() {
        let settings = Settings::parse_toml("").unwrap();
        assert_eq!(settings.pool.max_size, 10);
        assert_eq!(settings.auth.expiry_window_secs, 600);
        assert!(settings.auth.fallback_to_stale);
        assert_eq!(settings.health.services.len(), 4);
    }

    #[test]
    fn sections_override_defaults() {
        let settings = Settings::parse_toml(
            r#"
            [pool]
            max_size = 3
            borrow_timeout_ms = 250

            [health]
            probe_timeout_ms = 900
            degraded_latency_threshold_ms = 300
            services = ["wsfe", "wsaa"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.pool.max_size, 3);
        assert_eq!(settings.pool.borrow_timeout().as_millis(), 250);
        assert_eq!(
            settings.health.services,
            vec![ServiceName::Wsfe, ServiceName::Wsaa]
        );
    }

    #[test]
    fn rejects_zero_pool_size() {
        assert_eq!(
            invalid_field(Settings::parse_toml("[pool]\nmax_size = 0")),
            "max_size"
        );
    }

    #[test]
    fn rejects_request_window_over_one_day() {
        assert_eq!(
            invalid_field(Settings::parse_toml(
                "[auth]\nrequest_window_secs = 10000000000000"
            )),
            "request_window_secs"
        );
        assert!(Settings::parse_toml("[auth]\nrequest_window_secs = 86400").is_ok());
    }

    #[test]
    fn rejects_threshold_above_probe_timeout() {
        let toml = "[health]\nprobe_timeout_ms = 100\ndegraded_latency_threshold_ms = 100";
        assert_eq!(
            invalid_field(Settings::parse_toml(toml)),
            "degraded_latency_threshold_ms"
        );
    }

    #[test]
    fn rejects_bad_endpoint_override() {
        let toml = "[endpoints]\nwsfex = \"not a url\"";
        assert_eq!(invalid_field(Settings::parse_toml(toml)), "endpoints.wsfex");
    }

    #[test]
    fn endpoint_override_applies() {
        let settings =
            Settings::parse_toml("[endpoints]\nwsaa = \"http://127.0.0.1:8080/login\"").unwrap();
        let endpoints = settings.endpoints().unwrap();
        assert_eq!(
            endpoints.get(ServiceName::Wsaa).as_str(),
            "http://127.0.0.1:8080/login"
        );
    }

    #[test]
    fn blank_log_level_is_missing() {
        assert!(matches!(
            Settings::parse_toml("[logging]\nlevel = \" \""),
            Err(Error::Config(ConfigError::MissingField {
                field: "logging.level"
            }))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            Settings::parse_toml("environment = ["),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }
}
