//! Service response envelope.
//!
//! Every endpoint answers with `{body: <payload>, status: {code, text}}`.
//! Error responses carry a null body; `status.text` echoes the error only in
//! the dev profile.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResponseStatus {
    /// HTTP status code mirrored into the body
    pub code: u16,
    /// Optional human-readable detail
    pub text: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceResponse<T> {
    pub body: T,
    pub status: ResponseStatus,
}

impl<T: Serialize> ServiceResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            body,
            status: ResponseStatus {
                code: 200,
                text: String::new(),
            },
        }
    }
}
