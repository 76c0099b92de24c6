#![allow(dead_code)]

use asset_schema_api::config::EngineSettings;
use asset_schema_api::db::{DbPool, Repositories};
use asset_schema_api::entity::{asset_type_fields, asset_types, assets, field_types};
use asset_schema_api::services::field_validator::FieldPayload;
use asset_schema_api::services::{AssetTypeService, FieldService, FieldTypeCatalog};
use asset_schema_api::services::asset_type_service::AssetTypeInput;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tempfile::TempDir;

/// A migrated database; the SQLite file lives as long as the value
pub struct TestDb {
    pub repos: Repositories,
    pub settings: EngineSettings,
    _dir: Option<TempDir>,
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("asset_schema.db").display()
    );
    let conn = Database::connect(&url).await.expect("connect sqlite");
    Migrator::up(&conn, None).await.expect("run migrations");

    TestDb {
        repos: DbPool::from_connection(conn).repositories(),
        // One operation at a time keeps SQLite writers from contending
        settings: EngineSettings {
            reconcile_concurrency: 1,
            slug_retry_attempts: 3,
        },
        _dir: Some(dir),
    }
}

/// Migrated Postgres database named by `TEST_POSTGRES_URL`, with the default
/// catalog in place and the given reconcile concurrency
pub async fn setup_postgres(reconcile_concurrency: usize) -> TestDb {
    let url = std::env::var("TEST_POSTGRES_URL").expect("TEST_POSTGRES_URL must be set");
    let conn = Database::connect(&url).await.expect("connect postgres");
    Migrator::up(&conn, None).await.expect("run migrations");

    let db = TestDb {
        repos: DbPool::from_connection(conn).repositories(),
        settings: EngineSettings {
            reconcile_concurrency,
            slug_retry_attempts: 3,
        },
        _dir: None,
    };
    FieldTypeCatalog::new(&db.repos, &db.settings)
        .ensure_defaults()
        .await
        .expect("ensure defaults");
    db
}

/// Database with the default field type catalog in place
pub async fn setup_with_defaults() -> TestDb {
    let db = setup().await;
    FieldTypeCatalog::new(&db.repos, &db.settings)
        .ensure_defaults()
        .await
        .expect("ensure defaults");
    db
}

impl TestDb {
    pub fn fields(&self) -> FieldService<'_> {
        FieldService::new(&self.repos, &self.settings)
    }

    pub async fn field_type(&self, slug: &str) -> field_types::Model {
        FieldTypeCatalog::new(&self.repos, &self.settings)
            .find_by_slug(slug)
            .await
            .expect("lookup field type")
            .unwrap_or_else(|| panic!("field type {slug} missing"))
    }

    pub async fn asset_type(&self, name: &str) -> asset_types::Model {
        AssetTypeService::new(&self.repos)
            .create(&AssetTypeInput {
                name: Some(name.to_string()),
                image_url: None,
            })
            .await
            .expect("create asset type")
    }

    pub async fn asset(&self, asset_type_id: &str) -> assets::Model {
        AssetTypeService::new(&self.repos)
            .register_asset(asset_type_id, Some("test asset"))
            .await
            .expect("register asset")
    }

    /// Create a field of the given type slug
    pub async fn field(
        &self,
        asset_type_id: &str,
        name: &str,
        type_slug: &str,
    ) -> asset_type_fields::Model {
        let field_type = self.field_type(type_slug).await;
        self.fields()
            .create_field(asset_type_id, &FieldPayload::new(name, field_type.id), None)
            .await
            .expect("create field")
    }

    pub async fn create_with(
        &self,
        asset_type_id: &str,
        payload: FieldPayload,
    ) -> asset_type_fields::Model {
        self.fields()
            .create_field(asset_type_id, &payload, None)
            .await
            .expect("create field")
    }
}
