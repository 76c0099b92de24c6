// Database repository management

mod asset_repository;
mod asset_type_field_repository;
mod asset_type_repository;
mod field_type_repository;
mod field_value_repository;

pub use asset_repository::AssetRepository;
pub use asset_type_field_repository::AssetTypeFieldRepository;
pub use asset_type_repository::AssetTypeRepository;
pub use field_type_repository::FieldTypeRepository;
pub use field_value_repository::FieldValueRepository;

use sea_orm::DatabaseConnection;

/// Container for all database repositories
///
/// Repository methods take the connection explicitly so the same query can run
/// on the pool or inside a caller-owned transaction.
#[derive(Clone)]
pub struct Repositories {
    db: DatabaseConnection,
    pub field_types: FieldTypeRepository,
    pub asset_types: AssetTypeRepository,
    pub fields: AssetTypeFieldRepository,
    pub assets: AssetRepository,
    pub values: FieldValueRepository,
}

impl Repositories {
    /// Creates a new repositories container with database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Repositories {
            db,
            field_types: FieldTypeRepository::new(),
            asset_types: AssetTypeRepository::new(),
            fields: AssetTypeFieldRepository::new(),
            assets: AssetRepository::new(),
            values: FieldValueRepository::new(),
        }
    }

    /// Pooled connection for work outside a transaction
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
