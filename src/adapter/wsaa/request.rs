//! Login ticket request document.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::adapter::soap;
use crate::domain::ServiceName;
use crate::error::AuthError;

pub const NAMESPACE: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov";

/// The plaintext document that gets signed: which service, and the window
/// during which the login service should accept the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTicketRequest {
    pub unique_id: u32,
    pub generation_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub service_id: &'static str,
}

impl LoginTicketRequest {
    /// Request for `service` valid from `now - window` to `now + window`.
    ///
    /// The back-dated start tolerates clock drift against the login service.
    pub fn new(service: ServiceName, now: DateTime<Utc>, window: Duration) -> Result<Self, AuthError> {
        let service_id = service.ticket_id().ok_or(AuthError::NotTicketed(service))?;
        let window = chrono::Duration::from_std(window)
            .map_err(|e| AuthError::Signing(format!("invalid request window: {e}")))?;
        let out_of_range = || AuthError::Signing("request window out of range".to_string());
        Ok(Self {
            unique_id: now.timestamp() as u32,
            generation_time: now.checked_sub_signed(window).ok_or_else(out_of_range)?,
            expiration_time: now.checked_add_signed(window).ok_or_else(out_of_range)?,
            service_id,
        })
    }

    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <loginTicketRequest version=\"1.0\">\
             <header>\
             <uniqueId>{}</uniqueId>\
             <generationTime>{}</generationTime>\
             <expirationTime>{}</expirationTime>\
             </header>\
             <service>{}</service>\
             </loginTicketRequest>",
            self.unique_id,
            self.generation_time.to_rfc3339_opts(SecondsFormat::Secs, false),
            self.expiration_time.to_rfc3339_opts(SecondsFormat::Secs, false),
            self.service_id,
        )
    }
}

/// `loginCms` envelope carrying the signed blob.
#[must_use]
pub fn login_envelope(signed_blob: &str) -> String {
    let inner = format!("<ns:in0>{}</ns:in0>", soap::escape(signed_blob));
    soap::envelope(NAMESPACE, "loginCms", &inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_straddles_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let req = LoginTicketRequest::new(ServiceName::Wsfe, now, Duration::from_secs(600)).unwrap();
        assert_eq!(req.generation_time, Utc.with_ymd_and_hms(2024, 5, 1, 11, 50, 0).unwrap());
        assert_eq!(req.expiration_time, Utc.with_ymd_and_hms(2024, 5, 1, 12, 10, 0).unwrap());
        assert_eq!(req.unique_id, now.timestamp() as u32);
    }

    #[test]
    fn xml_carries_service_and_times() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let xml = LoginTicketRequest::new(ServiceName::Wsmtxca, now, Duration::from_secs(60))
            .unwrap()
            .to_xml();
        assert_eq!(soap::extract_tag(&xml, "service"), Some("wsmtxca"));
        assert_eq!(
            soap::extract_tag(&xml, "generationTime"),
            Some("2024-05-01T11:59:00+00:00")
        );
        assert_eq!(
            soap::extract_tag(&xml, "expirationTime"),
            Some("2024-05-01T12:01:00+00:00")
        );
    }

    #[test]
    fn login_service_cannot_request_itself() {
        let err = LoginTicketRequest::new(ServiceName::Wsaa, Utc::now(), Duration::from_secs(60))
            .unwrap_err();
        assert_eq!(err, AuthError::NotTicketed(ServiceName::Wsaa));
    }

    #[test]
    fn oversized_window_is_signing_error() {
        let err = LoginTicketRequest::new(
            ServiceName::Wsfe,
            Utc::now(),
            Duration::from_secs(10_000_000_000_000),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
    }

    #[test]
    fn envelope_escapes_blob() {
        let env = login_envelope("a+b/c=");
        assert_eq!(soap::extract_tag(&env, "in0"), Some("a+b/c="));
        assert!(env.contains("loginCms"));
    }
}
