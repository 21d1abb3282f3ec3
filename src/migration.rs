pub use sea_orm_migration::prelude::*;

mod m20250415_000001_create_session_table;
mod m20250415_000002_create_trust_chain_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Override the name of the migration table to avoid conflicts
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("openid4vp_storage_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250415_000001_create_session_table::Migration),
            Box::new(m20250415_000002_create_trust_chain_table::Migration),
        ]
    }
}
