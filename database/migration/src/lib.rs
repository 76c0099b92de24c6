pub use sea_orm_migration::prelude::*;

mod m20261016_000001_create_field_types_table;
mod m20261016_000002_create_asset_types_table;
mod m20261016_000003_create_asset_type_fields_table;
mod m20261016_000004_create_assets_table;
mod m20261016_000005_create_asset_field_values_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261016_000001_create_field_types_table::Migration),
            Box::new(m20261016_000002_create_asset_types_table::Migration),
            Box::new(m20261016_000003_create_asset_type_fields_table::Migration),
            Box::new(m20261016_000004_create_assets_table::Migration),
            Box::new(m20261016_000005_create_asset_field_values_table::Migration),
        ]
    }
}
