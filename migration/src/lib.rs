pub use sea_orm_migration::prelude::*;

mod m20260312_000001_catalog_init;
mod m20260312_000002_collection_grants;

pub struct Migrator;
#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260312_000001_catalog_init::Migration),
            Box::new(m20260312_000002_collection_grants::Migration),
        ]
    }
}
