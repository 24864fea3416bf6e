//! Login flow against a local HTTP server speaking the `loginCms` protocol.

use std::sync::Arc;
use std::time::Duration;

use afip_client::adapter::{soap, Ed25519Signer, HttpTransport, WsaaTicketIssuer};
use afip_client::error::AuthError;
use afip_client::port::TicketIssuer;
use afip_client::testkit::{self, fixtures};
use afip_client::ServiceName;
use base64::Engine;
use chrono::Utc;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/ws/services/LoginCms";

fn issuer(server: &MockServer) -> WsaaTicketIssuer {
    let endpoint = Url::parse(&format!("{}{LOGIN_PATH}", server.uri())).unwrap();
    let transport = HttpTransport::new(0, Duration::from_millis(500)).unwrap();
    WsaaTicketIssuer::new(
        endpoint,
        testkit::credential::generate(),
        Arc::new(Ed25519Signer::new()),
        Arc::new(transport),
    )
    .with_timeout(Duration::from_millis(500))
}

#[tokio::test]
async fn login_returns_ticket_from_response() {
    let server = MockServer::start().await;
    let now = Utc::now();
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(header("content-type", "text/xml; charset=utf-8"))
        .and(body_string_contains("loginCms"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixtures::login_response(
            "PD94bWwg",
            "aGVsbG8=",
            now,
            now + chrono::Duration::hours(12),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let ticket = issuer(&server).issue(ServiceName::Wsfe).await.unwrap();

    assert_eq!(ticket.token(), "PD94bWwg");
    assert_eq!(ticket.sign(), "aGVsbG8=");
    assert_eq!(ticket.service(), ServiceName::Wsfe);
    assert!(ticket.is_valid());
}

#[tokio::test]
async fn signed_request_names_the_target_service() {
    let server = MockServer::start().await;
    let now = Utc::now();
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixtures::login_response(
            "T",
            "S",
            now,
            now + chrono::Duration::hours(12),
        )))
        .mount(&server)
        .await;

    issuer(&server).issue(ServiceName::Wsfex).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body = String::from_utf8(received[0].body.clone()).unwrap();
    let blob = soap::tag_text(&body, "in0").unwrap();
    let envelope = base64::engine::general_purpose::STANDARD
        .decode(blob)
        .unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&envelope).unwrap();
    assert_eq!(envelope["algorithm"], "Ed25519");
    let content = base64::engine::general_purpose::STANDARD
        .decode(envelope["content"].as_str().unwrap())
        .unwrap();
    let content = String::from_utf8(content).unwrap();
    assert!(content.contains("<service>wsfex</service>"));
}

#[tokio::test]
async fn soap_fault_is_remote_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(fixtures::soap_fault(
            "ns1:cms.cert.untrusted",
            "Certificado no emitido por AC de confianza",
        )))
        .mount(&server)
        .await;

    let err = issuer(&server).issue(ServiceName::Wsfe).await.unwrap_err();
    match err {
        AuthError::RemoteAuth { service, reason } => {
            assert_eq!(service, ServiceName::Wsfe);
            assert!(reason.contains("cms.cert.untrusted"));
        }
        other => panic!("expected RemoteAuth, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_login_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = issuer(&server).issue(ServiceName::Wsmtxca).await.unwrap_err();
    assert!(matches!(err, AuthError::RemoteAuth { ref reason, .. } if reason.contains("timed out")));
}

#[tokio::test]
async fn unreachable_login_server_is_remote_error() {
    let transport = HttpTransport::new(0, Duration::from_millis(200)).unwrap();
    let issuer = WsaaTicketIssuer::new(
        Url::parse("http://127.0.0.1:9/ws/services/LoginCms").unwrap(),
        testkit::credential::generate(),
        Arc::new(Ed25519Signer::new()),
        Arc::new(transport),
    );

    let err = issuer.issue(ServiceName::Wsfe).await.unwrap_err();
    assert!(matches!(err, AuthError::RemoteAuth { .. }));
}
