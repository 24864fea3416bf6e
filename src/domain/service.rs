//! Remote service identities and per-environment endpoints.

use std::fmt;

use serde::Deserialize;
use url::Url;

/// The closed set of remote services this client talks to.
///
/// `Wsaa` is the login service that issues tickets; the others are business
/// services that require a ticket on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceName {
    Wsaa,
    Wsfe,
    Wsfex,
    Wsmtxca,
}

impl ServiceName {
    pub const ALL: [ServiceName; 4] = [Self::Wsaa, Self::Wsfe, Self::Wsfex, Self::Wsmtxca];

    /// Business services that are authorized by access tickets.
    pub const TICKETED: [ServiceName; 3] = [Self::Wsfe, Self::Wsfex, Self::Wsmtxca];

    /// Identifier sent in the login request, or `None` for the login service itself.
    #[must_use]
    pub const fn ticket_id(self) -> Option<&'static str> {
        match self {
            Self::Wsaa => None,
            Self::Wsfe => Some("wsfe"),
            Self::Wsfex => Some("wsfex"),
            Self::Wsmtxca => Some("wsmtxca"),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wsaa => "wsaa",
            Self::Wsfe => "wsfe",
            Self::Wsfex => "wsfex",
            Self::Wsmtxca => "wsmtxca",
        }
    }

    /// Resolve a ticket id (as found in a login response) back to a service.
    #[must_use]
    pub fn from_ticket_id(id: &str) -> Option<Self> {
        Self::TICKETED
            .into_iter()
            .find(|s| s.ticket_id().is_some_and(|t| t.eq_ignore_ascii_case(id.trim())))
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target environment (homologation vs production).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Testing,
    Production,
}

impl Environment {
    /// Default endpoint for `service` in this environment.
    #[must_use]
    pub const fn default_endpoint(self, service: ServiceName) -> &'static str {
        match (self, service) {
            (Self::Testing, ServiceName::Wsaa) => {
                "https://wsaahomo.afip.gov.ar/ws/services/LoginCms"
            }
            (Self::Production, ServiceName::Wsaa) => {
                "https://wsaa.afip.gov.ar/ws/services/LoginCms"
            }
            (Self::Testing, ServiceName::Wsfe) => {
                "https://wswhomo.afip.gov.ar/wsfev1/service.asmx"
            }
            (Self::Production, ServiceName::Wsfe) => {
                "https://servicios1.afip.gov.ar/wsfev1/service.asmx"
            }
            (Self::Testing, ServiceName::Wsfex) => {
                "https://wswhomo.afip.gov.ar/wsfexv1/service.asmx"
            }
            (Self::Production, ServiceName::Wsfex) => {
                "https://servicios1.afip.gov.ar/wsfexv1/service.asmx"
            }
            (Self::Testing, ServiceName::Wsmtxca) => {
                "https://fwshomo.afip.gov.ar/wsmtxca/services/MTXCAService"
            }
            (Self::Production, ServiceName::Wsmtxca) => {
                "https://serviciosjava.afip.gob.ar/wsmtxca/services/MTXCAService"
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testing => write!(f, "testing"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testing" | "homologacion" | "homo" => Ok(Self::Testing),
            "production" | "produccion" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Resolved endpoint addresses, one per service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    wsaa: Url,
    wsfe: Url,
    wsfex: Url,
    wsmtxca: Url,
}

impl Endpoints {
    /// Endpoints for `environment` with no overrides.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let url = |service| {
            Url::parse(environment.default_endpoint(service))
                .unwrap_or_else(|_| unreachable!("default endpoints are valid URLs"))
        };
        Self {
            wsaa: url(ServiceName::Wsaa),
            wsfe: url(ServiceName::Wsfe),
            wsfex: url(ServiceName::Wsfex),
            wsmtxca: url(ServiceName::Wsmtxca),
        }
    }

    /// Replace the endpoint for a single service.
    #[must_use]
    pub fn with(mut self, service: ServiceName, url: Url) -> Self {
        *self.slot(service) = url;
        self
    }

    #[must_use]
    pub fn get(&self, service: ServiceName) -> &Url {
        match service {
            ServiceName::Wsaa => &self.wsaa,
            ServiceName::Wsfe => &self.wsfe,
            ServiceName::Wsfex => &self.wsfex,
            ServiceName::Wsmtxca => &self.wsmtxca,
        }
    }

    fn slot(&mut self, service: ServiceName) -> &mut Url {
        match service {
            ServiceName::Wsaa => &mut self.wsaa,
            ServiceName::Wsfe => &mut self.wsfe,
            ServiceName::Wsfex => &mut self.wsfex,
            ServiceName::Wsmtxca => &mut self.wsmtxca,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_service_has_no_ticket_id() {
        assert_eq!(ServiceName::Wsaa.ticket_id(), None);
        for service in ServiceName::TICKETED {
            assert_eq!(service.ticket_id(), Some(service.as_str()));
        }
    }

    #[test]
    fn ticket_id_round_trips_case_insensitively() {
        assert_eq!(ServiceName::from_ticket_id("WSFE"), Some(ServiceName::Wsfe));
        assert_eq!(ServiceName::from_ticket_id(" wsmtxca "), Some(ServiceName::Wsmtxca));
        assert_eq!(ServiceName::from_ticket_id("wsaa"), None);
    }

    #[test]
    fn environments_resolve_distinct_hosts() {
        let testing = Endpoints::for_environment(Environment::Testing);
        let production = Endpoints::for_environment(Environment::Production);
        for service in ServiceName::ALL {
            assert_ne!(testing.get(service), production.get(service));
        }
        assert_eq!(
            testing.get(ServiceName::Wsaa).host_str(),
            Some("wsaahomo.afip.gov.ar")
        );
    }

    #[test]
    fn override_replaces_single_service() {
        let custom = Url::parse("http://127.0.0.1:9000/wsfe").unwrap();
        let endpoints =
            Endpoints::for_environment(Environment::Testing).with(ServiceName::Wsfe, custom.clone());
        assert_eq!(endpoints.get(ServiceName::Wsfe), &custom);
        assert_eq!(
            endpoints.get(ServiceName::Wsfex).as_str(),
            Environment::Testing.default_endpoint(ServiceName::Wsfex)
        );
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("homologacion".parse::<Environment>(), Ok(Environment::Testing));
        assert!("staging".parse::<Environment>().is_err());
    }
}
