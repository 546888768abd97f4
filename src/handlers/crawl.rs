//! Reconciliation trigger endpoint.

use axum::{extract::State, response::Json};

use crate::crawler::CrawlReport;
use crate::error::ApiError;
use crate::response::ServiceResponse;
use crate::server::AppState;

/// Trigger one full reconciliation run synchronously.
///
/// Answers 200 once the loop completes, however many individual portals
/// accumulated non-fatal errors; those are observability signals carried in
/// the report, not failures of the endpoint. Only a run-level failure (the
/// portal listing itself) produces an error response.
#[utoipa::path(
    post,
    path = "/crawler/start_poll",
    responses(
        (status = 200, description = "Run completed; per-portal outcomes in the body", body = CrawlReport),
        (status = 500, description = "Run could not start")
    ),
    tag = "crawler"
)]
pub async fn start_poll(
    State(state): State<AppState>,
) -> Result<Json<ServiceResponse<CrawlReport>>, ApiError> {
    let report = state
        .crawler
        .run(state.shutdown.child_token())
        .await
        .map_err(|err| ApiError::internal(err.to_string(), state.expose_errors))?;
    Ok(Json(ServiceResponse::ok(report)))
}
