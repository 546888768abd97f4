//! Transactional persistence for portals and their providers.
//!
//! Reads run under READ COMMITTED, writes (and the portal-id resolution that
//! precedes them) under SERIALIZABLE, so a provider insert is always
//! consistent with the portal it is attributed to and concurrent
//! reconciliation runs cannot interleave partial replacements. On the sqlite
//! test backend the isolation hint is not supported and the default
//! transaction is used instead.

pub mod portal;
pub mod provider;

pub use portal::{PortalQuery, PortalRepository, PortalSortField};
pub use provider::{NewProvider, ProviderRepository, ReplaceSummary};

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, IsolationLevel,
    TransactionTrait,
};
use thiserror::Error;

/// Errors surfaced by the portal/provider store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("portal with canonical name '{name}' not found")]
    PortalNotFound { name: String },
    #[error("invalid provider record: {reasons}")]
    InvalidProvider { reasons: String },
    #[error("seller relationship '{key}' already recorded")]
    Conflict { key: String },
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    /// The triggering error and the rollback failure, both visible.
    #[error("{source} (rollback also failed: {rollback})")]
    Rollback {
        source: Box<StoreError>,
        rollback: DbErr,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::PortalNotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Begin a read transaction (READ COMMITTED on Postgres).
pub(crate) async fn begin_read(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    begin_with_isolation(db, IsolationLevel::ReadCommitted).await
}

/// Begin a write transaction (SERIALIZABLE on Postgres).
pub(crate) async fn begin_write(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    begin_with_isolation(db, IsolationLevel::Serializable).await
}

async fn begin_with_isolation(
    db: &DatabaseConnection,
    isolation: IsolationLevel,
) -> Result<DatabaseTransaction, DbErr> {
    match db.get_database_backend() {
        DbBackend::Postgres => db.begin_with_config(Some(isolation), None).await,
        _ => db.begin().await,
    }
}

/// Roll the transaction back and preserve both errors if the rollback itself
/// fails, so neither is silently swallowed.
pub(crate) async fn rollback_on(txn: DatabaseTransaction, source: StoreError) -> StoreError {
    match txn.rollback().await {
        Ok(()) => source,
        Err(rollback) => StoreError::Rollback {
            source: Box::new(source),
            rollback,
        },
    }
}

/// True when the database rejected the statement for a unique-key violation.
pub(crate) fn is_unique_violation(error: &DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_UNIQUE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    match db_error.code() {
        Some(code) => {
            let code = code.as_ref();
            code == PG_UNIQUE || SQLITE_UNIQUE_CODES.contains(&code)
        }
        None => false,
    }
}
