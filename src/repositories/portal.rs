//! Portal repository for database operations.
//!
//! Portals are read-only for the crawler; this repository only exposes the
//! unfiltered listing used by the reconciliation run and the
//! filtered/sorted/paginated listing behind the portals API.

use std::sync::Arc;

use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::models::portal::{self, Entity as Portal};
use crate::repositories::{StoreError, begin_read, rollback_on};

/// Attribute the portal listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalSortField {
    Domain,
    CreationDate,
}

impl PortalSortField {
    fn column(self) -> portal::Column {
        match self {
            PortalSortField::Domain => portal::Column::CanonicalName,
            PortalSortField::CreationDate => portal::Column::CreatedAt,
        }
    }
}

/// Filter, sort, and pagination options for [`PortalRepository::list_filtered`].
#[derive(Debug, Clone)]
pub struct PortalQuery {
    /// Creation-time window; applied only when both bounds are present.
    pub from: Option<NaiveDateTime>,
    pub till: Option<NaiveDateTime>,
    pub sort_by: PortalSortField,
    pub desc: bool,
    /// 0 means no limit.
    pub limit: u64,
    pub offset: u64,
}

impl Default for PortalQuery {
    fn default() -> Self {
        Self {
            from: None,
            till: None,
            sort_by: PortalSortField::Domain,
            desc: false,
            limit: 0,
            offset: 0,
        }
    }
}

/// Repository for portal reads.
#[derive(Debug, Clone)]
pub struct PortalRepository {
    db: Arc<DatabaseConnection>,
}

impl PortalRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All portals, unfiltered. One store read per reconciliation run.
    pub async fn list_all(&self) -> Result<Vec<portal::Model>, StoreError> {
        let txn = begin_read(&self.db).await?;
        match Portal::find().all(&txn).await {
            Ok(portals) => {
                txn.commit().await?;
                Ok(portals)
            }
            Err(err) => Err(rollback_on(txn, err.into()).await),
        }
    }

    /// Filtered, sorted, paginated portals plus the total size of the
    /// filtered set before pagination.
    pub async fn list_filtered(
        &self,
        query: &PortalQuery,
    ) -> Result<(Vec<portal::Model>, u64), StoreError> {
        let txn = begin_read(&self.db).await?;
        match Self::run_filtered(&txn, query).await {
            Ok(page) => {
                txn.commit().await?;
                Ok(page)
            }
            Err(err) => Err(rollback_on(txn, err).await),
        }
    }

    async fn run_filtered(
        txn: &DatabaseTransaction,
        query: &PortalQuery,
    ) -> Result<(Vec<portal::Model>, u64), StoreError> {
        let mut base = Portal::find();
        if let (Some(from), Some(till)) = (query.from, query.till) {
            base = base
                .filter(portal::Column::CreatedAt.gte(from))
                .filter(portal::Column::CreatedAt.lte(till));
        }

        let total = base.clone().count(txn).await?;

        let column = query.sort_by.column();
        let mut select = if query.desc {
            base.order_by_desc(column)
        } else {
            base.order_by_asc(column)
        };
        if query.limit > 0 {
            select = select.limit(query.limit);
        }
        if query.offset > 0 {
            select = select.offset(query.offset);
        }

        let portals = select.all(txn).await?;
        Ok((portals, total))
    }
}
