//! Migration to create the portals table.
//!
//! Portals are the registered publisher domains whose `ads.txt` files the
//! crawler reconciles. `canonical_name` is the business key and must be
//! unique.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Portals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Portals::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Portals::Protocol).text().not_null())
                    .col(
                        ColumnDef::new(Portals::CanonicalName)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Portals::Email).text().not_null().default(""))
                    .col(ColumnDef::new(Portals::Phone).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Portals::CertInfo)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Portals::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("portals_name_protocol_idx")
                    .table(Portals::Table)
                    .col(Portals::CanonicalName)
                    .col(Portals::Protocol)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("portals_name_protocol_idx")
                    .table(Portals::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Portals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Portals {
    Table,
    Id,
    Protocol,
    CanonicalName,
    Email,
    Phone,
    CertInfo,
    CreatedAt,
}
