//! # Error Handling
//!
//! Converts module errors into the service-response envelope at the HTTP
//! boundary, with trace-id correlation. Outside the dev profile, error text
//! is logged but never echoed in the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::repositories::StoreError;
use crate::telemetry;

/// Join heterogeneous error strings into one descriptive error message.
/// A reporting convenience for per-portal aggregation, not a retry mechanism.
pub fn join_error_strings<I>(errors: I) -> String
where
    I: IntoIterator<Item = String>,
{
    errors.into_iter().collect::<Vec<_>>().join(", ")
}

/// API-boundary error rendered as the `{body, status}` envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Echo `message` in the response text (dev profile only).
    pub expose: bool,
    pub trace_id: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, expose: bool) -> Self {
        Self {
            status,
            message: message.into(),
            expose,
            trace_id: Self::current_trace_id(),
        }
    }

    pub fn internal(message: impl Into<String>, expose: bool) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, expose)
    }

    pub fn bad_request(message: impl Into<String>, expose: bool) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, expose)
    }

    /// Map a store error onto the HTTP surface: missing portals are 404,
    /// validation 400, duplicate seller relationships 409, the rest 500.
    pub fn from_store(err: StoreError, expose: bool) -> Self {
        let status = match &err {
            StoreError::PortalNotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::InvalidProvider { .. } => StatusCode::BAD_REQUEST,
            StoreError::Conflict { .. } => StatusCode::CONFLICT,
            StoreError::Db(_) | StoreError::Rollback { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string(), expose)
    }

    /// Extract the request's trace ID, falling back to a generated
    /// correlation ID so log lines stay correlatable.
    fn current_trace_id() -> Option<String> {
        telemetry::current_trace_id()
            .or_else(|| Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8])))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(
            status = self.status.as_u16(),
            trace_id = self.trace_id.as_deref().unwrap_or(""),
            "{}",
            self.message
        );

        let text = if self.expose {
            self.message
        } else {
            String::new()
        };
        let envelope = json!({
            "body": null,
            "status": {
                "code": self.status.as_u16(),
                "text": text,
            },
        });
        (self.status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_errors_with_comma_separator() {
        let joined = join_error_strings(vec![
            "first failure".to_string(),
            "second failure".to_string(),
        ]);
        assert_eq!(joined, "first failure, second failure");
    }

    #[test]
    fn join_of_single_error_has_no_separator() {
        assert_eq!(join_error_strings(vec!["only".to_string()]), "only");
    }

    #[test]
    fn store_errors_map_to_expected_status_codes() {
        let not_found = ApiError::from_store(
            StoreError::PortalNotFound {
                name: "cnn.com".to_string(),
            },
            true,
        );
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert!(not_found.message.contains("cnn.com"));

        let conflict = ApiError::from_store(
            StoreError::Conflict {
                key: "google.com/pub-1/direct".to_string(),
            },
            false,
        );
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let invalid = ApiError::from_store(
            StoreError::InvalidProvider {
                reasons: "domain name cannot be empty".to_string(),
            },
            false,
        );
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    }
}
