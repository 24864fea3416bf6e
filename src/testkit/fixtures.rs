//! Canned SOAP bodies shaped like the platform's responses.

use chrono::{DateTime, FixedOffset, Utc};

use crate::adapter::soap;

/// A `loginCms` response for a ticket valid between the given instants.
///
/// Timestamps are rendered in the platform's local offset (-03:00) with
/// millisecond precision.
pub fn login_response(
    token: &str,
    sign: &str,
    generated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> String {
    let offset = FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| unreachable!());
    let fmt = |t: DateTime<Utc>| {
        t.with_timezone(&offset)
            .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
            .to_string()
    };
    login_response_raw(token, sign, &fmt(generated_at), &fmt(expires_at))
}

/// A `loginCms` response with timestamps passed through verbatim.
pub fn login_response_raw(token: &str, sign: &str, generated: &str, expires: &str) -> String {
    let ticket = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <loginTicketResponse version=\"1.0\">\
         <header><source>CN=wsaahomo</source><destination>SERIALNUMBER=CUIT 20000000001</destination>\
         <uniqueId>1234567</uniqueId>\
         <generationTime>{generated}</generationTime>\
         <expirationTime>{expires}</expirationTime></header>\
         <credentials><token>{token}</token><sign>{sign}</sign></credentials>\
         </loginTicketResponse>"
    );
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"{}\">\
         <soapenv:Body><loginCmsResponse xmlns=\"http://wsaa.view.sua.dvadac.desein.afip.gov\">\
         <loginCmsReturn>{}</loginCmsReturn>\
         </loginCmsResponse></soapenv:Body></soapenv:Envelope>",
        soap::ENVELOPE_NS,
        soap::escape(&ticket)
    )
}

/// A SOAP fault body.
pub fn soap_fault(code: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"{}\"><soapenv:Body>\
         <soapenv:Fault><faultcode>{}</faultcode><faultstring>{}</faultstring></soapenv:Fault>\
         </soapenv:Body></soapenv:Envelope>",
        soap::ENVELOPE_NS,
        soap::escape(code),
        soap::escape(message)
    )
}

/// A status ("dummy") response reporting the three component states.
pub fn dummy_response(app: &str, db: &str, auth: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"{}\"><soap:Body>\
         <FEDummyResponse xmlns=\"http://ar.gov.afip.dif.FEV1/\"><FEDummyResult>\
         <AppServer>{app}</AppServer><DbServer>{db}</DbServer><AuthServer>{auth}</AuthServer>\
         </FEDummyResult></FEDummyResponse>\
         </soap:Body></soap:Envelope>",
        soap::ENVELOPE_NS
    )
}
