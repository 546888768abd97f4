//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and provides
//! fixture helpers for portals.

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Statement,
};
use std::sync::Arc;

use adswatch::models::portal;

/// In-memory SQLite database with all migrations applied and the seed
/// portals removed, so each test starts from an empty registry.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;

    for table in ["providers", "portals"] {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("DELETE FROM {table}"),
        ))
        .await?;
    }

    Ok(db)
}

#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Insert a portal fixture and return its assigned id.
#[allow(dead_code)]
pub async fn insert_portal(
    db: &DatabaseConnection,
    protocol: &str,
    canonical_name: &str,
    email: &str,
    phone: &str,
) -> Result<i32> {
    insert_portal_at(
        db,
        protocol,
        canonical_name,
        email,
        phone,
        Utc::now().naive_utc(),
    )
    .await
}

/// Insert a portal fixture with an explicit creation timestamp.
#[allow(dead_code)]
pub async fn insert_portal_at(
    db: &DatabaseConnection,
    protocol: &str,
    canonical_name: &str,
    email: &str,
    phone: &str,
    created_at: NaiveDateTime,
) -> Result<i32> {
    let model = portal::ActiveModel {
        protocol: Set(protocol.to_string()),
        canonical_name: Set(canonical_name.to_string()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        cert_info: Set(String::new()),
        created_at: Set(created_at),
        ..Default::default()
    };
    let res = portal::Entity::insert(model).exec(db).await?;
    Ok(res.last_insert_id)
}
