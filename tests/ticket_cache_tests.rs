//! Ticket cache behavior observed through the public API.

use std::sync::Arc;
use std::time::Duration;

use afip_client::error::AuthError;
use afip_client::port::TicketIssuer;
use afip_client::testkit;
use afip_client::testkit::issuer::{CountingIssuer, Issued};
use afip_client::{ServiceName, TicketCache};
use futures_util::future::join_all;

fn cache(issuer: &Arc<CountingIssuer>) -> Arc<TicketCache> {
    Arc::new(TicketCache::new(
        Arc::clone(issuer) as Arc<dyn TicketIssuer>,
        testkit::config::ticket_cache(true),
    ))
}

#[tokio::test]
async fn miss_then_hit_reuses_twelve_hour_ticket() -> anyhow::Result<()> {
    let issuer = Arc::new(CountingIssuer::new());
    let cache = cache(&issuer);

    let first = cache.get_valid_ticket(ServiceName::Wsfe).await?;
    let second = cache.get_valid_ticket(ServiceName::Wsfe).await?;

    assert_eq!(first.token(), second.token());
    assert_eq!(issuer.calls(), 1);
    let stats = cache.statistics();
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert!((stats.hit_ratio() - 0.5).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn fifty_concurrent_callers_trigger_one_login() {
    let issuer = Arc::new(CountingIssuer::new().with_delay(Duration::from_millis(150)));
    let cache = cache(&issuer);

    let results = join_all((0..50).map(|_| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_valid_ticket(ServiceName::Wsmtxca).await })
    }))
    .await;

    let tokens: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().token().to_string())
        .collect();
    assert!(tokens.iter().all(|t| t == "token-1"));
    assert_eq!(issuer.calls(), 1);
    assert_eq!(cache.in_flight(), 0);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_ticket() {
    let rejected = AuthError::RemoteAuth {
        service: ServiceName::Wsfex,
        reason: "coe.notAuthorized".into(),
    };
    let issuer = Arc::new(
        CountingIssuer::failing(rejected.clone()).then(Issued::Ticket(Duration::from_secs(120))),
    );
    let cache = cache(&issuer);

    let original = cache.get_valid_ticket(ServiceName::Wsfex).await.unwrap();
    // Inside the refresh window: the refresh fails and the still-valid ticket is served.
    let served = cache.get_valid_ticket(ServiceName::Wsfex).await.unwrap();
    assert_eq!(served, original);
    assert_eq!(cache.cached(ServiceName::Wsfex), Some(original));

    // A caller-chosen window that the ticket satisfies is a plain hit.
    let hit = cache
        .get_valid_ticket_within(ServiceName::Wsfex, Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(hit.token(), "token-1");

    let stats = cache.statistics();
    assert_eq!(stats.refresh_failures, 1);
    assert_eq!(stats.stale_served, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn refresh_after_failure_starts_a_new_flight() {
    let issuer = Arc::new(
        CountingIssuer::new().then(Issued::Fail(AuthError::Signing("hsm busy".into()))),
    );
    let cache = cache(&issuer);

    let err = cache.get_valid_ticket(ServiceName::Wsfe).await.unwrap_err();
    assert_eq!(err, AuthError::Signing("hsm busy".into()));

    let ticket = cache.get_valid_ticket(ServiceName::Wsfe).await.unwrap();
    assert_eq!(ticket.token(), "token-2");
    assert_eq!(issuer.calls(), 2);
}
