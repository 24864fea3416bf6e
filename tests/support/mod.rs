#![allow(dead_code)]

use std::time::Duration;

use afip_client::port::SoapRequest;
use url::Url;

/// A request to a placeholder endpoint; scripted transports ignore the address.
pub fn request(action: &str) -> SoapRequest {
    SoapRequest {
        endpoint: Url::parse("http://127.0.0.1:9/service.asmx").unwrap(),
        action: action.to_string(),
        body: "<ping/>".into(),
        timeout: Duration::from_secs(5),
    }
}

/// Settings with every endpoint pointed at `base` and short timeouts.
pub fn local_settings(base: &str) -> afip_client::Settings {
    let toml = format!(
        r#"
environment = "testing"

[auth]
login_timeout_ms = 2000

[pool]
max_size = 2
borrow_timeout_ms = 500
per_call_timeout_ms = 2000
connect_timeout_ms = 500

[health]
probe_timeout_ms = 1000
degraded_latency_threshold_ms = 800
services = ["wsaa", "wsfe"]

[endpoints]
wsaa = "{base}/ws/services/LoginCms"
wsfe = "{base}/wsfev1/service.asmx"
wsfex = "{base}/wsfexv1/service.asmx"
wsmtxca = "{base}/wsmtxca/services/MTXCAService"
"#
    );
    afip_client::Settings::parse_toml(&toml).unwrap()
}
