//! Decoding of `loginCms` responses.

use chrono::{DateTime, Utc};

use crate::adapter::soap;
use crate::domain::{AuthTicket, ServiceName};
use crate::error::AuthError;
use crate::port::SoapResponse;

/// Turn a login response into a ticket for `service`.
///
/// Faults and non-2xx statuses are rejections; anything structurally wrong
/// with a 2xx body is a parse error. A ticket that is already expired at
/// `now` is rejected so it can never be cached.
pub fn parse_login_response(
    service: ServiceName,
    response: &SoapResponse,
    now: DateTime<Utc>,
) -> Result<AuthTicket, AuthError> {
    if let Some(fault) = soap::fault(&response.body) {
        return Err(AuthError::RemoteAuth {
            service,
            reason: format!("{}: {}", fault.code, fault.message),
        });
    }
    if !response.is_success() {
        return Err(AuthError::RemoteAuth {
            service,
            reason: format!("HTTP status {}", response.status),
        });
    }

    let ticket_xml = soap::extract_tag(&response.body, "loginCmsReturn")
        .map(|raw| soap::unescape(raw.trim()))
        .ok_or_else(|| AuthError::Parse("response has no loginCmsReturn".into()))?;

    let field = |tag: &'static str| {
        soap::tag_text(&ticket_xml, tag)
            .ok_or_else(|| AuthError::Parse(format!("ticket response has no {tag}")))
    };
    let token = field("token")?;
    let sign = field("sign")?;
    let generated_at = parse_time("generationTime", &field("generationTime")?)?;
    let expires_at = parse_time("expirationTime", &field("expirationTime")?)?;

    if let Some(destination_service) = soap::tag_text(&ticket_xml, "service") {
        if ServiceName::from_ticket_id(&destination_service) != Some(service) {
            return Err(AuthError::Parse(format!(
                "ticket issued for '{destination_service}', expected '{service}'"
            )));
        }
    }

    let ticket = AuthTicket::new(service, token, sign, generated_at, expires_at)?;
    if !ticket.is_valid_at(now) {
        return Err(AuthError::Parse(format!(
            "ticket already expired at {expires_at}"
        )));
    }
    Ok(ticket)
}

fn parse_time(field: &str, raw: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AuthError::Parse(format!("invalid {field} '{raw}': {e}")))
}
