//! # Server Configuration
//!
//! Application state, router assembly, and the serve loop with graceful
//! shutdown. Shutdown cancels the crawl token so an in-flight reconciliation
//! stops launching new portal work while running transactions finish or roll
//! back cleanly.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    routing::post,
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::crawler::Crawler;
use crate::handlers;
use crate::notify::{LoggingEmailNotifier, NoopSmsNotifier};
use crate::repositories::{PortalRepository, ProviderRepository};
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub portals: PortalRepository,
    pub providers: ProviderRepository,
    pub crawler: Arc<Crawler>,
    /// Echo error text in responses (dev profile only)
    pub expose_errors: bool,
    /// Cancelled on process shutdown; crawl runs take child tokens
    pub shutdown: CancellationToken,
}

/// Attach a fresh trace id to every request so error envelopes and log lines
/// stay correlatable.
async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let context = TraceContext {
        trace_id: uuid::Uuid::new_v4().to_string(),
    };
    telemetry::with_trace_context(context, next.run(request)).await
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/crawler/admin/version", get(handlers::version))
        .route("/crawler/start_poll", post(handlers::crawl::start_poll))
        .route(
            "/crawler/portals",
            get(handlers::portals::get_portals).post(handlers::portals::query_portals),
        )
        .route(
            "/crawler/providers/portal/{name}",
            get(handlers::providers::get_providers_by_portal)
                .delete(handlers::providers::delete_providers_by_portal),
        )
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let db = Arc::new(db);
    let email = Arc::new(LoggingEmailNotifier {
        sender: config.email_sender.clone(),
    });
    let sms = Arc::new(NoopSmsNotifier);
    let crawler = Crawler::new(db.clone(), email, sms, config.crawler_config())?;

    let shutdown = CancellationToken::new();
    let state = AppState {
        portals: PortalRepository::new(db.clone()),
        providers: ProviderRepository::new(db.clone()),
        crawler: Arc::new(crawler),
        expose_errors: config.expose_errors(),
        shutdown: shutdown.clone(),
        db,
    };
    let app = create_app(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile = %config.profile, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::version,
        crate::handlers::crawl::start_poll,
        crate::handlers::portals::get_portals,
        crate::handlers::portals::query_portals,
        crate::handlers::providers::get_providers_by_portal,
        crate::handlers::providers::delete_providers_by_portal,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::portal::Model,
            crate::models::provider::Model,
            crate::crawler::CrawlReport,
            crate::crawler::PortalOutcome,
            crate::crawler::PortalStatus,
            crate::handlers::portals::PortalsQueryRequest,
            crate::handlers::portals::PortalsPage,
            crate::handlers::providers::PurgeSummary,
        )
    ),
    info(
        title = "Adswatch Crawler API",
        description = "Reconciles registered portals against their published ads.txt files",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
