//! Portal entity model
//!
//! A portal is a registered publisher domain tracked for `ads.txt`
//! compliance. Portals are seeded out-of-band and read-only from the
//! crawler's perspective; `canonical_name` is the unique business key.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "portals")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Store-assigned identity, not exposed over the API
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,

    /// Fetch scheme for the ads.txt request, "http" or "https"
    pub protocol: String,

    /// Unique domain name, e.g. "cnn.com"
    pub canonical_name: String,

    /// Admin email contact; empty disables the email channel
    pub email: String,

    /// Admin phone contact; empty disables the SMS channel
    pub phone: String,

    /// Opaque certificate metadata, not interpreted by the crawler
    pub cert_info: String,

    /// Timestamp when the portal was registered
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::provider::Entity")]
    Provider,
}

impl Related<super::provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
