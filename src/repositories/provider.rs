//! Provider repository for database operations.
//!
//! Providers are owned by exactly one portal and replaced wholesale on every
//! reconciliation cycle. The replace runs as a single serializable
//! transaction (resolve portal, delete, insert, commit) so readers never
//! observe a half-replaced portal.

use std::sync::Arc;

use chrono::NaiveDateTime;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect,
};

use crate::adstxt::{AccountType, ParsedSeller};
use crate::models::portal::{self, Entity as Portal};
use crate::models::provider::{self, Entity as Provider};
use crate::repositories::{StoreError, begin_read, begin_write, is_unique_violation, rollback_on};

/// A provider record ready for insertion, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewProvider {
    pub domain_name: String,
    pub account_id: String,
    pub account_type: AccountType,
    pub cert_auth_id: String,
    pub created_at: NaiveDateTime,
}

impl NewProvider {
    /// Stamp a parsed seller record with its insertion timestamp.
    pub fn from_parsed(seller: ParsedSeller, created_at: NaiveDateTime) -> Self {
        Self {
            domain_name: seller.domain_name,
            account_id: seller.account_id,
            account_type: seller.account_type,
            cert_auth_id: seller.cert_auth_id,
            created_at,
        }
    }

    /// Reject records with empty required fields before they reach the
    /// database. Never retried.
    fn validate(&self) -> Result<(), StoreError> {
        let mut reasons = Vec::new();
        if self.domain_name.is_empty() {
            reasons.push("domain name cannot be empty");
        }
        if self.account_id.is_empty() {
            reasons.push("account id cannot be empty");
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(StoreError::InvalidProvider {
                reasons: reasons.join(", "),
            })
        }
    }

    fn seller_key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.domain_name, self.account_id, self.account_type
        )
    }

    fn active_model(&self, portal_id: i32) -> provider::ActiveModel {
        provider::ActiveModel {
            domain_name: Set(self.domain_name.clone()),
            account_id: Set(self.account_id.clone()),
            account_type: Set(self.account_type.as_str().to_string()),
            cert_auth_id: Set(self.cert_auth_id.clone()),
            portal_id: Set(portal_id),
            created_at: Set(self.created_at),
            ..Default::default()
        }
    }
}

/// Counts reported by a successful [`ProviderRepository::replace_for_portal`].
#[derive(Debug, Clone, Copy)]
pub struct ReplaceSummary {
    pub portal_id: i32,
    pub deleted: u64,
    pub inserted: usize,
}

/// Repository for provider reads and the atomic replace-by-portal writes.
#[derive(Debug, Clone)]
pub struct ProviderRepository {
    db: Arc<DatabaseConnection>,
}

impl ProviderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Providers owned by the named portal.
    pub async fn list_by_portal(
        &self,
        portal_name: &str,
    ) -> Result<Vec<provider::Model>, StoreError> {
        let txn = begin_read(&self.db).await?;
        let result = async {
            let portal_id = resolve_portal_id(&txn, portal_name).await?;
            let providers = Provider::find()
                .filter(provider::Column::PortalId.eq(portal_id))
                .all(&txn)
                .await?;
            Ok(providers)
        }
        .await;

        match result {
            Ok(providers) => {
                txn.commit().await?;
                Ok(providers)
            }
            Err(err) => Err(rollback_on(txn, err).await),
        }
    }

    /// Insert one provider and return its assigned id.
    pub async fn insert(
        &self,
        portal_id: i32,
        record: &NewProvider,
    ) -> Result<i32, StoreError> {
        record.validate()?;
        let txn = begin_write(&self.db).await?;
        match insert_record(&txn, portal_id, record).await {
            Ok(id) => {
                txn.commit().await?;
                Ok(id)
            }
            Err(err) => Err(rollback_on(txn, err).await),
        }
    }

    /// Delete every provider owned by the named portal, returning the number
    /// of rows removed.
    pub async fn delete_for_portal(&self, portal_name: &str) -> Result<u64, StoreError> {
        let txn = begin_write(&self.db).await?;
        let result = async {
            let portal_id = resolve_portal_id(&txn, portal_name).await?;
            let deleted = Provider::delete_many()
                .filter(provider::Column::PortalId.eq(portal_id))
                .exec(&txn)
                .await?;
            Ok(deleted.rows_affected)
        }
        .await;

        match result {
            Ok(deleted) => {
                txn.commit().await?;
                Ok(deleted)
            }
            Err(err) => Err(rollback_on(txn, err).await),
        }
    }

    /// Atomically replace the portal's providers with `records`: one
    /// serializable transaction covering resolve, delete, and every insert.
    /// Failure at any step rolls the whole operation back, so a reader never
    /// observes the portal with a partial set.
    pub async fn replace_for_portal(
        &self,
        portal_name: &str,
        records: &[NewProvider],
    ) -> Result<ReplaceSummary, StoreError> {
        for record in records {
            record.validate()?;
        }

        let txn = begin_write(&self.db).await?;
        let result = async {
            let portal_id = resolve_portal_id(&txn, portal_name).await?;
            let deleted = Provider::delete_many()
                .filter(provider::Column::PortalId.eq(portal_id))
                .exec(&txn)
                .await?
                .rows_affected;

            for record in records {
                insert_record(&txn, portal_id, record).await?;
            }

            Ok(ReplaceSummary {
                portal_id,
                deleted,
                inserted: records.len(),
            })
        }
        .await;

        match result {
            Ok(summary) => {
                txn.commit().await?;
                Ok(summary)
            }
            Err(err) => Err(rollback_on(txn, err).await),
        }
    }
}

/// Resolve a portal's id by canonical name inside the caller's transaction.
async fn resolve_portal_id(
    txn: &DatabaseTransaction,
    portal_name: &str,
) -> Result<i32, StoreError> {
    let portal = Portal::find()
        .filter(portal::Column::CanonicalName.eq(portal_name))
        .limit(1)
        .one(txn)
        .await?;
    portal
        .map(|p| p.id)
        .ok_or_else(|| StoreError::PortalNotFound {
            name: portal_name.to_string(),
        })
}

async fn insert_record<C: ConnectionTrait>(
    conn: &C,
    portal_id: i32,
    record: &NewProvider,
) -> Result<i32, StoreError> {
    let insert = Provider::insert(record.active_model(portal_id))
        .exec(conn)
        .await;
    match insert {
        Ok(res) => Ok(res.last_insert_id),
        Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict {
            key: record.seller_key(),
        }),
        Err(err) => Err(err.into()),
    }
}
