//! Crawl orchestrator.
//!
//! Drives one full reconciliation run: list portals, fetch each one's
//! `ads.txt`, parse it, atomically replace the portal's stored providers,
//! and notify portal admins when no file is published. Portals are processed
//! by a bounded worker pool; one portal's failure never aborts the run, and
//! the run as a whole succeeds once the pool drains regardless of how many
//! portals accumulated non-fatal errors.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;
use utoipa::ToSchema;

use crate::adstxt;
use crate::error::join_error_strings;
use crate::models::portal;
use crate::notify::{EmailNotifier, SmsNotifier, notify_portal_admins};
use crate::repositories::{NewProvider, PortalRepository, ProviderRepository, StoreError};

/// Tuning knobs for the reconciliation run.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Maximum number of portals processed concurrently.
    pub concurrency: usize,
    /// Per-portal fetch deadline; a slow portal fails alone.
    pub fetch_timeout: Duration,
    /// Deadline for one portal's whole pipeline (fetch, parse, replace,
    /// notify), so a stalled store call cannot pin a worker.
    pub portal_deadline: Duration,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_timeout: Duration::from_secs(10),
            portal_deadline: Duration::from_secs(30),
            user_agent: concat!("adswatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Run-level failure: the run could not start at all.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("failed to find any portals in storage: {0}")]
    ListPortals(#[from] StoreError),
    #[error("failed to build crawl HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Terminal state of one portal's reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PortalStatus {
    /// 2xx: providers parsed and atomically replaced.
    Replaced,
    /// 404: no ads.txt published; admins notified.
    Notified,
    /// 401: retry-over-https extension point, currently skipped.
    Unauthorized,
    /// Any other status code: anomalous, portal skipped.
    UnexpectedStatus,
    /// Transport or store failure; the run continued without this portal.
    Failed,
    /// Run was cancelled before this portal started.
    Cancelled,
}

/// Per-portal outcome collected into the run report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PortalOutcome {
    pub portal: String,
    pub status: PortalStatus,
    pub lines_seen: usize,
    pub providers_parsed: usize,
    pub providers_inserted: usize,
    /// Aggregated non-fatal errors for this portal.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl PortalOutcome {
    fn new(portal: &portal::Model, status: PortalStatus) -> Self {
        Self {
            portal: portal.canonical_name.clone(),
            status,
            lines_seen: 0,
            providers_parsed: 0,
            providers_inserted: 0,
            errors: Vec::new(),
        }
    }

    fn failed(portal: &portal::Model, error: String) -> Self {
        let mut outcome = Self::new(portal, PortalStatus::Failed);
        outcome.errors.push(error);
        outcome
    }
}

/// Report for one full reconciliation run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CrawlReport {
    pub portals: usize,
    pub duration_ms: u64,
    pub outcomes: Vec<PortalOutcome>,
}

/// Orchestrates the fetch → parse → replace → notify pipeline.
#[derive(Clone)]
pub struct Crawler {
    portals: PortalRepository,
    providers: ProviderRepository,
    http: reqwest::Client,
    email: Arc<dyn EmailNotifier>,
    sms: Arc<dyn SmsNotifier>,
    config: CrawlerConfig,
}

impl Crawler {
    pub fn new(
        db: Arc<DatabaseConnection>,
        email: Arc<dyn EmailNotifier>,
        sms: Arc<dyn SmsNotifier>,
        config: CrawlerConfig,
    ) -> Result<Self, CrawlError> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            portals: PortalRepository::new(db.clone()),
            providers: ProviderRepository::new(db),
            http,
            email,
            sms,
            config,
        })
    }

    /// Run one full reconciliation pass over all portals.
    ///
    /// Only the initial portal listing can fail the run; every later error is
    /// scoped to its portal and reported in the returned [`CrawlReport`].
    /// Cancellation stops launching new portal work; portals already running
    /// finish (or roll back) cleanly.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlReport, CrawlError> {
        let start = Instant::now();
        let portals = self.portals.list_all().await?;
        let total = portals.len();
        info!(portals = total, "starting reconciliation run");

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for portal in portals {
            let crawler = self.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!(portal = %portal.canonical_name, "run cancelled before portal started");
                        return PortalOutcome::new(&portal, PortalStatus::Cancelled);
                    }
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return PortalOutcome::failed(&portal, "worker pool closed".to_string()),
                    },
                };
                let deadline = crawler.config.portal_deadline;
                match tokio::time::timeout(deadline, crawler.process_portal(&portal)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        error!(
                            portal = %portal.canonical_name,
                            deadline_s = deadline.as_secs_f64(),
                            "portal processing exceeded its deadline"
                        );
                        PortalOutcome::failed(
                            &portal,
                            format!("portal processing exceeded its deadline of {deadline:?}"),
                        )
                    }
                }
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    counter!("adswatch_portals_processed_total").increment(1);
                    outcomes.push(outcome);
                }
                Err(err) => error!(error = %err, "portal worker panicked"),
            }
        }

        let duration = start.elapsed();
        histogram!("adswatch_crawl_duration_seconds").record(duration.as_secs_f64());
        info!(
            portals = total,
            duration_s = duration.as_secs_f64(),
            "poll completed"
        );

        Ok(CrawlReport {
            portals: total,
            duration_ms: duration.as_millis() as u64,
            outcomes,
        })
    }

    /// Reconcile a single portal: fetch, classify by status code, then parse
    /// and replace or notify.
    async fn process_portal(&self, portal: &portal::Model) -> PortalOutcome {
        let raw_url = format!(
            "{}://{}/ads.txt",
            portal.protocol, portal.canonical_name
        );
        let url = match Url::parse(&raw_url) {
            Ok(url) => url,
            Err(err) => {
                error!(portal = %portal.canonical_name, error = %err, "invalid portal URL");
                return PortalOutcome::failed(portal, format!("invalid URL '{raw_url}': {err}"));
            }
        };

        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "plain/text; charset=utf-8")
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                // Transport failure (DNS, connect, timeout) fails this portal
                // only; the run continues.
                error!(portal = %portal.canonical_name, error = %err, "ads.txt fetch failed");
                return PortalOutcome::failed(portal, format!("fetch '{url}': {err}"));
            }
        };

        let status = response.status();
        if status.is_success() {
            match response.text().await {
                Ok(body) => self.replace_from_body(portal, &body).await,
                Err(err) => PortalOutcome::failed(portal, format!("read body: {err}")),
            }
        } else if status == reqwest::StatusCode::UNAUTHORIZED {
            // Extension point: retry over https. Not implemented.
            warn!(portal = %portal.canonical_name, "got 401 for ads.txt; https retry not implemented, skipping");
            PortalOutcome::new(portal, PortalStatus::Unauthorized)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            self.notify_missing(portal).await
        } else {
            // Anomalous status code. Skip just this portal; the run goes on.
            error!(
                portal = %portal.canonical_name,
                status = status.as_u16(),
                url = %url,
                "unexpected response code for portal"
            );
            PortalOutcome::new(portal, PortalStatus::UnexpectedStatus)
        }
    }

    /// Parse the response body and atomically replace the portal's providers.
    async fn replace_from_body(&self, portal: &portal::Model, body: &str) -> PortalOutcome {
        let mut outcome = PortalOutcome::new(portal, PortalStatus::Replaced);
        let now = Utc::now().naive_utc();
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for line in body.lines() {
            outcome.lines_seen += 1;
            match adstxt::parse_line(line) {
                Ok(Some(seller)) => {
                    if seen.insert(seller.seller_key()) {
                        records.push(NewProvider::from_parsed(seller, now));
                    } else {
                        debug!(portal = %portal.canonical_name, line, "duplicate seller line skipped");
                    }
                }
                // Blank lines, comments, and malformed rows are expected.
                Ok(None) => {}
                Err(err) => outcome.errors.push(err.to_string()),
            }
        }
        outcome.providers_parsed = records.len();

        info!(
            portal = %portal.canonical_name,
            protocol = %portal.protocol,
            lines = outcome.lines_seen,
            parsed = outcome.providers_parsed,
            "parsed ads.txt"
        );

        match self
            .providers
            .replace_for_portal(&portal.canonical_name, &records)
            .await
        {
            Ok(summary) => {
                outcome.providers_inserted = summary.inserted;
                counter!("adswatch_providers_inserted_total")
                    .increment(summary.inserted as u64);
            }
            Err(err) => {
                outcome.status = PortalStatus::Failed;
                outcome.errors.push(err.to_string());
            }
        }

        if !outcome.errors.is_empty() {
            error!(
                portal = %portal.canonical_name,
                "errors for portal: {}",
                join_error_strings(outcome.errors.clone())
            );
        }
        outcome
    }

    /// 404: no ads.txt published. Notify admins; never fatal.
    async fn notify_missing(&self, portal: &portal::Model) -> PortalOutcome {
        let mut outcome = PortalOutcome::new(portal, PortalStatus::Notified);
        counter!("adswatch_portals_missing_adstxt_total").increment(1);
        if let Err(err) =
            notify_portal_admins(self.email.as_ref(), self.sms.as_ref(), portal).await
        {
            warn!(portal = %portal.canonical_name, error = %err, "admin notification failed");
            outcome.errors.push(err.to_string());
        }
        outcome
    }
}
