//! # Data Models
//!
//! SeaORM entities for the portal registry and the authorized-seller records
//! reconciled from each portal's `ads.txt`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod portal;
pub mod provider;

pub use portal::Entity as Portal;
pub use provider::Entity as Provider;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "adswatch".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
