//! Minimal SOAP 1.1 envelope building and response scanning.
//!
//! The services answer with small, flat documents, so responses are scanned
//! for the handful of elements we need rather than parsed into a tree.

pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// A `soap:Fault` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    pub code: String,
    pub message: String,
}

/// Wrap `operation` (with already-serialized `inner` children) in an envelope.
#[must_use]
pub fn envelope(namespace: &str, operation: &str, inner: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"{ENVELOPE_NS}\" xmlns:ns=\"{namespace}\">\
         <soapenv:Header/>\
         <soapenv:Body><ns:{operation}>{inner}</ns:{operation}></soapenv:Body>\
         </soapenv:Envelope>"
    )
}

/// Escape text for use inside an element.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]. `&amp;` is handled last so `&amp;lt;` stays `&lt;`.
#[must_use]
pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#13;", "\r")
        .replace("&#xD;", "\r")
        .replace("&amp;", "&")
}

/// Text content of the first element whose local name is `tag`.
///
/// Namespace prefixes are ignored (`<ns1:token>` matches `token`). Returns
/// `Some("")` for a self-closing element.
#[must_use]
pub fn extract_tag<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let mut cursor = 0;
    while let Some(rel) = xml[cursor..].find('<') {
        let name_start = cursor + rel + 1;
        let rest = &xml[name_start..];
        let name_len = rest.find(|c: char| c == '>' || c == '/' || c.is_whitespace())?;
        let name = &rest[..name_len];
        let local = name.rsplit(':').next().unwrap_or(name);

        if !name.is_empty() && local == tag {
            let open_end = name_start + rest.find('>')?;
            if xml[..open_end].ends_with('/') {
                return Some("");
            }
            let content_start = open_end + 1;
            let close = format!("</{name}>");
            let close_at = xml[content_start..].find(&close)?;
            return Some(&xml[content_start..content_start + close_at]);
        }
        cursor = name_start;
    }
    None
}

/// Trimmed, unescaped text of `tag`, or `None` when missing or blank.
#[must_use]
pub fn tag_text(xml: &str, tag: &str) -> Option<String> {
    extract_tag(xml, tag)
        .map(|raw| unescape(raw.trim()))
        .filter(|text| !text.is_empty())
}

/// The fault carried by `xml`, if any.
#[must_use]
pub fn fault(xml: &str) -> Option<SoapFault> {
    let body = extract_tag(xml, "Fault")?;
    Some(SoapFault {
        code: tag_text(body, "faultcode").unwrap_or_else(|| "unknown".into()),
        message: tag_text(body, "faultstring").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_operation() {
        let env = envelope("http://example/ns", "loginCms", "<ns:in0>x</ns:in0>");
        assert!(env.contains("<ns:loginCms><ns:in0>x</ns:in0></ns:loginCms>"));
        assert!(env.contains("xmlns:ns=\"http://example/ns\""));
        assert_eq!(extract_tag(&env, "in0"), Some("x"));
    }

    #[test]
    fn extract_ignores_prefixes_and_attributes() {
        let xml = r#"<a:root><b:token id="1">abc</b:token><sign>def</sign></a:root>"#;
        assert_eq!(extract_tag(xml, "token"), Some("abc"));
        assert_eq!(extract_tag(xml, "sign"), Some("def"));
        assert_eq!(extract_tag(xml, "missing"), None);
    }

    #[test]
    fn extract_does_not_match_name_prefix() {
        let xml = "<tokenType>x</tokenType><token>y</token>";
        assert_eq!(extract_tag(xml, "token"), Some("y"));
    }

    #[test]
    fn extract_self_closing() {
        assert_eq!(extract_tag("<a><Header/></a>", "Header"), Some(""));
        assert_eq!(tag_text("<a><Header/></a>", "Header"), None);
    }

    #[test]
    fn escape_and_unescape_are_inverse() {
        let raw = r#"<t a="1">&'x'</t>"#;
        assert_eq!(unescape(&escape(raw)), raw);
        assert_eq!(unescape("&amp;lt;"), "&lt;");
    }

    #[test]
    fn fault_is_detected() {
        let xml = "<soapenv:Envelope><soapenv:Body><soapenv:Fault>\
                   <faultcode>ns1:cms.bad</faultcode>\
                   <faultstring>CMS no es valido</faultstring>\
                   </soapenv:Fault></soapenv:Body></soapenv:Envelope>";
        let f = fault(xml).unwrap();
        assert_eq!(f.code, "ns1:cms.bad");
        assert_eq!(f.message, "CMS no es valido");
        assert!(fault("<ok/>").is_none());
    }
}
