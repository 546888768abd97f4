//! Seed migration inserting the initial portal registry.
//!
//! Portals are created out-of-band from the crawler's perspective; this seed
//! set gives a fresh deployment something to reconcile against.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEED_PORTALS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "http",
        "cnn.com",
        "ee1@ee.ee",
        "+044-1234567",
        "files:transport.pem,transport.key;type:pem",
    ),
    (
        "http",
        "gizmodo.com",
        "ee2@ee.ee",
        "+044-1234567",
        "files:transport.pem,transport.key;type:pem",
    ),
    (
        "http",
        "nytimes.com",
        "ee3@ee.ee",
        "+044-1234567",
        "files:transport.pem,transport.key;type:pem",
    ),
    (
        "https",
        "bloomberg.com",
        "ee4@ee.ee",
        "+044-1234567",
        "files:transport.der,transport.key;type:der",
    ),
    (
        "https",
        "wordpress.com",
        "ee5@ee.ee",
        "+044-1234567",
        "files:transport.pem,transport.key;type:pem",
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (protocol, name, email, phone, cert_info) in SEED_PORTALS {
            let insert = Query::insert()
                .into_table(Portals::Table)
                .columns([
                    Portals::Protocol,
                    Portals::CanonicalName,
                    Portals::Email,
                    Portals::Phone,
                    Portals::CertInfo,
                ])
                .values_panic([
                    (*protocol).into(),
                    (*name).into(),
                    (*email).into(),
                    (*phone).into(),
                    (*cert_info).into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names: Vec<SimpleExpr> = SEED_PORTALS
            .iter()
            .map(|(_, name, _, _, _)| (*name).into())
            .collect();
        let delete = Query::delete()
            .from_table(Portals::Table)
            .cond_where(Expr::col(Portals::CanonicalName).is_in(names))
            .to_owned();
        manager.exec_stmt(delete).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Portals {
    Table,
    Protocol,
    CanonicalName,
    Email,
    Phone,
    CertInfo,
}
