//! Provider entity model
//!
//! One authorized-seller relationship declared in a portal's `ads.txt`.
//! Rows are created and destroyed wholesale by the reconciliation run; the
//! `(domain_name, account_id, account_type)` triple is unique store-wide.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "providers")]
pub struct Model {
    /// Store-assigned identity, not exposed over the API
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,

    /// Ad-system domain, lower-cased, e.g. "google.com"
    #[serde(rename = "domainName")]
    pub domain_name: String,

    /// Seller account identifier on the ad system
    #[serde(rename = "accountID")]
    pub account_id: String,

    /// "direct" or "reseller"
    #[serde(rename = "accountType")]
    pub account_type: String,

    /// Optional certification authority ID; empty when absent
    #[serde(rename = "certAuthID")]
    pub cert_auth_id: String,

    /// Owning portal
    #[serde(rename = "portalID")]
    pub portal_id: i32,

    /// Timestamp of the reconciliation run that inserted this row
    #[serde(rename = "createdAt")]
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portal::Entity",
        from = "Column::PortalId",
        to = "super::portal::Column::Id"
    )]
    Portal,
}

impl Related<super::portal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
