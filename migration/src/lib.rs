//! Database migrations for the adswatch service.

pub use sea_orm_migration::prelude::*;

mod m2026_01_10_000001_create_portals;
mod m2026_01_10_000002_create_providers;
mod m2026_01_10_000003_seed_portals;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_10_000001_create_portals::Migration),
            Box::new(m2026_01_10_000002_create_providers::Migration),
            Box::new(m2026_01_10_000003_seed_portals::Migration),
        ]
    }
}
