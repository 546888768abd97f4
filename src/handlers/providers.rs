//! Provider endpoints, keyed by the owning portal's canonical name.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::provider;
use crate::response::ServiceResponse;
use crate::server::AppState;

/// Result of purging a portal's providers.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurgeSummary {
    pub deleted: u64,
}

/// Providers owned by the named portal.
#[utoipa::path(
    get,
    path = "/crawler/providers/portal/{name}",
    params(("name" = String, Path, description = "Portal canonical name")),
    responses(
        (status = 200, description = "Providers for the portal"),
        (status = 404, description = "Unknown portal"),
        (status = 500, description = "Store failure")
    ),
    tag = "providers"
)]
pub async fn get_providers_by_portal(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceResponse<Vec<provider::Model>>>, ApiError> {
    let providers = state
        .providers
        .list_by_portal(&name)
        .await
        .map_err(|err| ApiError::from_store(err, state.expose_errors))?;
    info!(portal = %name, count = providers.len(), "retrieved providers from storage");
    Ok(Json(ServiceResponse::ok(providers)))
}

/// Purge every provider owned by the named portal.
#[utoipa::path(
    delete,
    path = "/crawler/providers/portal/{name}",
    params(("name" = String, Path, description = "Portal canonical name")),
    responses(
        (status = 200, description = "Providers deleted", body = PurgeSummary),
        (status = 404, description = "Unknown portal"),
        (status = 500, description = "Store failure")
    ),
    tag = "providers"
)]
pub async fn delete_providers_by_portal(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ServiceResponse<PurgeSummary>>, ApiError> {
    let deleted = state
        .providers
        .delete_for_portal(&name)
        .await
        .map_err(|err| ApiError::from_store(err, state.expose_errors))?;
    info!(portal = %name, deleted, "deleted providers from storage");
    Ok(Json(ServiceResponse::ok(PurgeSummary { deleted })))
}
