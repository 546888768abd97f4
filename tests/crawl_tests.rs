//! End-to-end crawl tests against wiremock-served `ads.txt` files.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adswatch::adstxt::AccountType;
use adswatch::crawler::{Crawler, CrawlerConfig, PortalOutcome, PortalStatus};
use adswatch::notify::{EmailNotifier, NotifyError, SmsNotifier};
use adswatch::repositories::{NewProvider, ProviderRepository};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{insert_portal, setup_test_db_arc};

#[derive(Default)]
struct RecordingEmail {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EmailNotifier for RecordingEmail {
    async fn send(&self, to_addr: &str, msg: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((to_addr.to_string(), msg.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl SmsNotifier for RecordingSms {
    async fn send(&self, to_addr: &str, _msg: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(to_addr.to_string());
        Ok(())
    }
}

/// Host-and-port portal name for a mock server, e.g. `127.0.0.1:9321`.
fn host_of(server: &MockServer) -> String {
    server
        .uri()
        .strip_prefix("http://")
        .expect("mock server serves plain http")
        .to_string()
}

fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        fetch_timeout: Duration::from_millis(500),
        ..CrawlerConfig::default()
    }
}

fn outcome_for<'a>(outcomes: &'a [PortalOutcome], portal: &str) -> &'a PortalOutcome {
    outcomes
        .iter()
        .find(|o| o.portal == portal)
        .unwrap_or_else(|| panic!("no outcome for portal '{portal}'"))
}

async fn serve_ads_txt(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/ads.txt"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn successful_fetch_replaces_the_provider_set() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let server = MockServer::start().await;
    let portal_name = host_of(&server);
    let portal_id = insert_portal(&db, "http", &portal_name, "", "").await?;

    // Stale row that the crawl must replace.
    let providers = ProviderRepository::new(db.clone());
    providers
        .insert(
            portal_id,
            &NewProvider {
                domain_name: "stale.com".to_string(),
                account_id: "pub-0".to_string(),
                account_type: AccountType::Direct,
                cert_auth_id: String::new(),
                created_at: chrono::Utc::now().naive_utc(),
            },
        )
        .await?;

    let body = "\
# contact: ads@example.com
google.com, pub-1234, DIRECT, f08c47fec0942fa0

appnexus.com, 5678, RESELLER
google.com, pub-1234, direct, f08c47fec0942fa0
subdomain=divisions.example.com
";
    serve_ads_txt(&server, 200, body).await;

    let crawler = Crawler::new(
        db.clone(),
        Arc::new(RecordingEmail::default()),
        Arc::new(RecordingSms::default()),
        test_config(),
    )?;
    let report = crawler.run(CancellationToken::new()).await?;

    assert_eq!(report.portals, 1);
    let outcome = outcome_for(&report.outcomes, &portal_name);
    assert_eq!(outcome.status, PortalStatus::Replaced);
    assert_eq!(outcome.lines_seen, 6);
    // The duplicate google.com line and the non-seller lines are dropped.
    assert_eq!(outcome.providers_parsed, 2);
    assert_eq!(outcome.providers_inserted, 2);

    let mut domains: Vec<_> = providers
        .list_by_portal(&portal_name)
        .await?
        .into_iter()
        .map(|p| p.domain_name)
        .collect();
    domains.sort();
    assert_eq!(domains, ["appnexus.com", "google.com"]);
    Ok(())
}

#[tokio::test]
async fn missing_ads_txt_notifies_admins_and_keeps_previous_providers() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let server = MockServer::start().await;
    let portal_name = host_of(&server);
    let portal_id = insert_portal(&db, "http", &portal_name, "admin@portal.test", "").await?;

    let providers = ProviderRepository::new(db.clone());
    providers
        .insert(
            portal_id,
            &NewProvider {
                domain_name: "google.com".to_string(),
                account_id: "pub-1".to_string(),
                account_type: AccountType::Direct,
                cert_auth_id: String::new(),
                created_at: chrono::Utc::now().naive_utc(),
            },
        )
        .await?;

    serve_ads_txt(&server, 404, "not found").await;

    let email = Arc::new(RecordingEmail::default());
    let crawler = Crawler::new(
        db.clone(),
        email.clone(),
        Arc::new(RecordingSms::default()),
        test_config(),
    )?;
    let report = crawler.run(CancellationToken::new()).await?;

    let outcome = outcome_for(&report.outcomes, &portal_name);
    assert_eq!(outcome.status, PortalStatus::Notified);
    assert!(outcome.errors.is_empty());

    let sent = email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "admin@portal.test");
    assert!(sent[0].1.contains("no publicly available 'ads.txt'"));
    drop(sent);

    // A missing file must not purge what was previously reconciled.
    assert_eq!(providers.list_by_portal(&portal_name).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn slow_portal_fails_alone_without_blocking_the_run() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;
    let slow_name = host_of(&slow);
    let fast_name = host_of(&fast);
    insert_portal(&db, "http", &slow_name, "", "").await?;
    insert_portal(&db, "http", &fast_name, "", "").await?;

    Mock::given(method("GET"))
        .and(path("/ads.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_string("google.com, pub-1, direct"),
        )
        .mount(&slow)
        .await;
    serve_ads_txt(&fast, 200, "google.com, pub-1, direct").await;

    let crawler = Crawler::new(
        db.clone(),
        Arc::new(RecordingEmail::default()),
        Arc::new(RecordingSms::default()),
        test_config(),
    )?;
    let report = crawler.run(CancellationToken::new()).await?;

    assert_eq!(report.portals, 2);
    let slow_outcome = outcome_for(&report.outcomes, &slow_name);
    assert_eq!(slow_outcome.status, PortalStatus::Failed);
    assert!(!slow_outcome.errors.is_empty());

    let fast_outcome = outcome_for(&report.outcomes, &fast_name);
    assert_eq!(fast_outcome.status, PortalStatus::Replaced);
    assert_eq!(fast_outcome.providers_inserted, 1);
    Ok(())
}

#[tokio::test]
async fn portal_deadline_bounds_the_whole_pipeline() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let stalled = MockServer::start().await;
    let healthy = MockServer::start().await;
    let stalled_name = host_of(&stalled);
    let healthy_name = host_of(&healthy);
    insert_portal(&db, "http", &stalled_name, "", "").await?;
    insert_portal(&db, "http", &healthy_name, "", "").await?;

    // The client would wait this response out; the pipeline deadline must not.
    Mock::given(method("GET"))
        .and(path("/ads.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_string("google.com, pub-1, direct"),
        )
        .mount(&stalled)
        .await;
    serve_ads_txt(&healthy, 200, "google.com, pub-1, direct").await;

    let crawler = Crawler::new(
        db.clone(),
        Arc::new(RecordingEmail::default()),
        Arc::new(RecordingSms::default()),
        CrawlerConfig {
            fetch_timeout: Duration::from_secs(30),
            portal_deadline: Duration::from_millis(250),
            ..CrawlerConfig::default()
        },
    )?;
    let report = crawler.run(CancellationToken::new()).await?;

    let stalled_outcome = outcome_for(&report.outcomes, &stalled_name);
    assert_eq!(stalled_outcome.status, PortalStatus::Failed);
    assert!(
        stalled_outcome
            .errors
            .iter()
            .any(|e| e.contains("deadline")),
        "errors were {:?}",
        stalled_outcome.errors
    );

    let healthy_outcome = outcome_for(&report.outcomes, &healthy_name);
    assert_eq!(healthy_outcome.status, PortalStatus::Replaced);
    Ok(())
}

#[tokio::test]
async fn unexpected_status_skips_the_portal_and_continues() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let broken = MockServer::start().await;
    let healthy = MockServer::start().await;
    let broken_name = host_of(&broken);
    let healthy_name = host_of(&healthy);
    insert_portal(&db, "http", &broken_name, "", "").await?;
    insert_portal(&db, "http", &healthy_name, "", "").await?;

    serve_ads_txt(&broken, 503, "maintenance").await;
    serve_ads_txt(&healthy, 200, "google.com, pub-1, direct").await;

    let crawler = Crawler::new(
        db.clone(),
        Arc::new(RecordingEmail::default()),
        Arc::new(RecordingSms::default()),
        test_config(),
    )?;
    let report = crawler.run(CancellationToken::new()).await?;

    let broken_outcome = outcome_for(&report.outcomes, &broken_name);
    assert_eq!(broken_outcome.status, PortalStatus::UnexpectedStatus);

    let healthy_outcome = outcome_for(&report.outcomes, &healthy_name);
    assert_eq!(healthy_outcome.status, PortalStatus::Replaced);
    Ok(())
}

#[tokio::test]
async fn unauthorized_portal_is_skipped() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let server = MockServer::start().await;
    let portal_name = host_of(&server);
    insert_portal(&db, "http", &portal_name, "admin@portal.test", "").await?;

    serve_ads_txt(&server, 401, "").await;

    let email = Arc::new(RecordingEmail::default());
    let crawler = Crawler::new(
        db.clone(),
        email.clone(),
        Arc::new(RecordingSms::default()),
        test_config(),
    )?;
    let report = crawler.run(CancellationToken::new()).await?;

    let outcome = outcome_for(&report.outcomes, &portal_name);
    assert_eq!(outcome.status, PortalStatus::Unauthorized);
    // 401 is not a "missing file" case, so nobody is notified.
    assert!(email.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn cancelled_run_launches_no_portal_work() -> Result<()> {
    let db = setup_test_db_arc().await?;
    insert_portal(&db, "http", "cnn.com", "", "").await?;
    insert_portal(&db, "http", "gizmodo.com", "", "").await?;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let crawler = Crawler::new(
        db.clone(),
        Arc::new(RecordingEmail::default()),
        Arc::new(RecordingSms::default()),
        test_config(),
    )?;
    let report = crawler.run(cancel).await?;

    assert_eq!(report.portals, 2);
    assert!(
        report
            .outcomes
            .iter()
            .all(|o| o.status == PortalStatus::Cancelled)
    );
    Ok(())
}
