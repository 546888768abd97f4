//! Migration to create the providers table.
//!
//! A provider row is one authorized-seller relationship parsed from a
//! portal's `ads.txt`. The `(domain_name, account_id, account_type)` triple
//! records a seller relationship exactly once.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Providers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Providers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Providers::DomainName).text().not_null())
                    .col(ColumnDef::new(Providers::AccountId).text().not_null())
                    .col(
                        ColumnDef::new(Providers::AccountType)
                            .text()
                            .not_null()
                            .check(
                                Expr::col(Providers::AccountType)
                                    .is_in(["direct", "reseller"]),
                            ),
                    )
                    .col(
                        ColumnDef::new(Providers::CertAuthId)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Providers::PortalId).integer().not_null())
                    .col(
                        ColumnDef::new(Providers::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("providers_portal_id_fkey")
                            .from(Providers::Table, Providers::PortalId)
                            .to(Portals::Table, Portals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("providers_seller_key")
                    .table(Providers::Table)
                    .col(Providers::DomainName)
                    .col(Providers::AccountId)
                    .col(Providers::AccountType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("providers_portal_id_idx")
                    .table(Providers::Table)
                    .col(Providers::PortalId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("providers_portal_id_idx")
                    .table(Providers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("providers_seller_key")
                    .table(Providers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Providers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Providers {
    Table,
    Id,
    DomainName,
    AccountId,
    AccountType,
    CertAuthId,
    PortalId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Portals {
    Table,
    Id,
}
