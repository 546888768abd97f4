//! Portal listing endpoints.

use axum::{extract::State, response::Json};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::portal;
use crate::repositories::{PortalQuery, PortalSortField};
use crate::response::ServiceResponse;
use crate::server::AppState;

const SORT_BY_DOMAIN: &str = "domain";
const SORT_BY_CREATION_DATE: &str = "created";

/// Filter/sort/pagination request for the portals listing.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PortalsQueryRequest {
    /// "domain" (default) or "created"
    #[serde(default)]
    pub sort_by: String,
    /// Window start, epoch seconds; 0 disables the window
    #[serde(default)]
    pub from: i64,
    /// Window end, epoch seconds; 0 disables the window
    #[serde(default)]
    pub till: i64,
    #[serde(default)]
    pub desc: bool,
    /// 0 means no limit
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// One page of portals plus the filtered total.
#[derive(Debug, Serialize, ToSchema)]
pub struct PortalsPage {
    pub portals: Vec<portal::Model>,
    /// Size of the filtered set before pagination
    pub total: u64,
}

/// All portals, unfiltered.
#[utoipa::path(
    get,
    path = "/crawler/portals",
    responses(
        (status = 200, description = "All registered portals"),
        (status = 500, description = "Store failure")
    ),
    tag = "portals"
)]
pub async fn get_portals(
    State(state): State<AppState>,
) -> Result<Json<ServiceResponse<Vec<portal::Model>>>, ApiError> {
    let portals = state
        .portals
        .list_all()
        .await
        .map_err(|err| ApiError::from_store(err, state.expose_errors))?;
    Ok(Json(ServiceResponse::ok(portals)))
}

/// Filtered, sorted, paginated portals.
#[utoipa::path(
    post,
    path = "/crawler/portals",
    request_body = PortalsQueryRequest,
    responses(
        (status = 200, description = "Matching portals and filtered total", body = PortalsPage),
        (status = 400, description = "Unsupported sort attribute"),
        (status = 500, description = "Store failure")
    ),
    tag = "portals"
)]
pub async fn query_portals(
    State(state): State<AppState>,
    Json(req): Json<PortalsQueryRequest>,
) -> Result<Json<ServiceResponse<PortalsPage>>, ApiError> {
    let sort_by = match req.sort_by.as_str() {
        "" | SORT_BY_DOMAIN => PortalSortField::Domain,
        SORT_BY_CREATION_DATE => PortalSortField::CreationDate,
        other => {
            return Err(ApiError::bad_request(
                format!("sorting attribute '{other}' not supported"),
                state.expose_errors,
            ));
        }
    };

    let query = PortalQuery {
        from: epoch_bound(req.from),
        till: epoch_bound(req.till),
        sort_by,
        desc: req.desc,
        limit: req.limit,
        offset: req.offset,
    };

    let (portals, total) = state
        .portals
        .list_filtered(&query)
        .await
        .map_err(|err| ApiError::from_store(err, state.expose_errors))?;
    Ok(Json(ServiceResponse::ok(PortalsPage { portals, total })))
}

/// Zero means "no bound"; the creation-time window applies only when both
/// bounds are present.
fn epoch_bound(secs: i64) -> Option<chrono::NaiveDateTime> {
    if secs > 0 {
        DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
    } else {
        None
    }
}
