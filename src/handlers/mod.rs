//! # API Handlers
//!
//! HTTP endpoint handlers for the crawler API.

use axum::{extract::State, response::Json};

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::response::ServiceResponse;
use crate::server::AppState;

pub mod crawl;
pub mod portals;
pub mod providers;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Service name and version, for deployment checks.
#[utoipa::path(
    get,
    path = "/crawler/admin/version",
    responses(
        (status = 200, description = "Service version string")
    ),
    tag = "admin"
)]
pub async fn version() -> Json<ServiceResponse<String>> {
    let info = ServiceInfo::default();
    Json(ServiceResponse::ok(format!(
        "{} Service, version {}",
        info.service, info.version
    )))
}

/// Liveness probe backed by a trivial database round trip.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are reachable"),
        (status = 500, description = "Database unreachable")
    ),
    tag = "admin"
)]
pub async fn healthz(
    State(state): State<AppState>,
) -> Result<Json<ServiceResponse<String>>, ApiError> {
    crate::db::health_check(&state.db)
        .await
        .map_err(|err| ApiError::internal(err.to_string(), state.expose_errors))?;
    Ok(Json(ServiceResponse::ok("ok".to_string())))
}
