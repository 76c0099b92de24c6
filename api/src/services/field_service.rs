// Asset-type field definition create, update, delete and listing

use chrono::Utc;
use sea_orm::{ConnectionTrait, Set, TransactionTrait};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::db::{DbError, Repositories};
use crate::entity::{asset_type_fields, field_types};
use crate::error::{SchemaError, SchemaResult};
use crate::services::field_validator::{FieldDefinition, FieldPayload};
use crate::services::record_projector::{field_in_use, RecordProjector};
use crate::services::slug::{resolve_unique, slugify, with_slug_retry, AssetTypeFieldSlugs};

/// A field definition with its field type, as listed to clients
#[derive(Debug, Clone, Serialize)]
pub struct FieldWithType {
    #[serde(flatten)]
    pub field: asset_type_fields::Model,
    pub field_type: Option<field_types::Model>,
}

pub struct FieldService<'a> {
    repos: &'a Repositories,
    settings: &'a EngineSettings,
}

impl<'a> FieldService<'a> {
    pub fn new(repos: &'a Repositories, settings: &'a EngineSettings) -> Self {
        Self { repos, settings }
    }

    async fn require_asset_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: &str,
    ) -> SchemaResult<()> {
        self.repos
            .asset_types
            .find_by_id(conn, asset_type_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| SchemaError::not_found(format!("Asset type {}", asset_type_id)))
    }

    /// Field owned by `asset_type_id`; a field of another type is reported as missing
    async fn require_field<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: &str,
        field_id: &str,
    ) -> SchemaResult<asset_type_fields::Model> {
        self.repos
            .fields
            .find_by_id(conn, field_id)
            .await?
            .filter(|f| f.asset_type_id == asset_type_id)
            .ok_or_else(|| SchemaError::not_found(format!("Field {}", field_id)))
    }

    async fn resolve_field_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        payload: &FieldPayload,
    ) -> SchemaResult<Option<field_types::Model>> {
        let Some(id) = payload.field_type_id_str() else {
            return Ok(None);
        };
        self.repos
            .field_types
            .find_by_id(conn, id)
            .await?
            .map(Some)
            .ok_or_else(|| SchemaError::InvalidReference("Invalid field type".to_string()))
    }

    pub async fn list_fields(&self, asset_type_id: &str) -> SchemaResult<Vec<FieldWithType>> {
        let conn = self.repos.db();
        self.require_asset_type(conn, asset_type_id).await?;

        let rows = self.repos.fields.find_with_types(conn, asset_type_id).await?;
        Ok(rows
            .into_iter()
            .map(|(field, field_type)| FieldWithType { field, field_type })
            .collect())
    }

    pub async fn create_field(
        &self,
        asset_type_id: &str,
        payload: &FieldPayload,
        actor: Option<&str>,
    ) -> SchemaResult<asset_type_fields::Model> {
        self.create_field_with_slug_base(asset_type_id, payload, None, actor)
            .await
    }

    /// Create a field whose slug derives from `slug_base` instead of its name
    pub async fn create_field_with_slug_base(
        &self,
        asset_type_id: &str,
        payload: &FieldPayload,
        slug_base: Option<&str>,
        actor: Option<&str>,
    ) -> SchemaResult<asset_type_fields::Model> {
        with_slug_retry(self.settings.slug_retry_attempts, move || {
            self.try_create(asset_type_id, payload, slug_base, actor)
        })
        .await
    }

    async fn try_create(
        &self,
        asset_type_id: &str,
        payload: &FieldPayload,
        slug_base: Option<&str>,
        actor: Option<&str>,
    ) -> SchemaResult<asset_type_fields::Model> {
        let txn = self.repos.db().begin().await.map_err(DbError::from)?;
        self.require_asset_type(&txn, asset_type_id).await?;

        let field_type = self.resolve_field_type(&txn, payload).await?;
        let definition = FieldDefinition::try_from_payload(payload, field_type.as_ref())?;

        let display_order = match definition.display_order {
            Some(order) => order,
            None => self
                .repos
                .fields
                .max_display_order(&txn, asset_type_id)
                .await?
                .map_or(0, |max| max + 1),
        };

        let base = slugify(slug_base.unwrap_or(&definition.name));
        let scope = AssetTypeFieldSlugs::new(&self.repos.fields, &txn, asset_type_id);
        let slug = resolve_unique(&scope, &base).await?;

        let now = Utc::now();
        let row = asset_type_fields::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            asset_type_id: Set(asset_type_id.to_string()),
            field_type_id: Set(definition.field_type_id),
            name: Set(definition.name),
            slug: Set(slug),
            description: Set(definition.description),
            is_required: Set(definition.is_required),
            default_value: Set(definition.default_value),
            options: Set(definition.options),
            validation_rules: Set(definition.validation_rules),
            display_order: Set(display_order),
            created_by: Set(actor.map(str::to_string)),
            updated_by: Set(actor.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = self.repos.fields.insert(&txn, row).await?;
        txn.commit().await.map_err(DbError::from)?;

        info!(
            "Created field '{}' ({}) on asset type {}",
            created.slug, created.id, asset_type_id
        );
        Ok(created)
    }

    /// Apply `patch` over the stored definition and validate the merged result
    pub async fn update_field(
        &self,
        asset_type_id: &str,
        field_id: &str,
        patch: &FieldPayload,
        actor: Option<&str>,
    ) -> SchemaResult<asset_type_fields::Model> {
        with_slug_retry(self.settings.slug_retry_attempts, move || {
            self.try_update(asset_type_id, field_id, patch, actor)
        })
        .await
    }

    async fn try_update(
        &self,
        asset_type_id: &str,
        field_id: &str,
        patch: &FieldPayload,
        actor: Option<&str>,
    ) -> SchemaResult<asset_type_fields::Model> {
        let txn = self.repos.db().begin().await.map_err(DbError::from)?;
        let existing = self.require_field(&txn, asset_type_id, field_id).await?;

        let merged = FieldPayload::from_model(&existing).overlay(patch);
        let field_type = self.resolve_field_type(&txn, &merged).await?;
        let definition = FieldDefinition::try_from_payload(&merged, field_type.as_ref())?;

        let slug = if definition.name != existing.name {
            let scope = AssetTypeFieldSlugs::new(&self.repos.fields, &txn, asset_type_id)
                .excluding(field_id);
            resolve_unique(&scope, &slugify(&definition.name)).await?
        } else {
            existing.slug.clone()
        };

        let display_order = definition.display_order.unwrap_or(existing.display_order);
        let mut row: asset_type_fields::ActiveModel = existing.into();
        row.name = Set(definition.name);
        row.slug = Set(slug);
        row.field_type_id = Set(definition.field_type_id);
        row.description = Set(definition.description);
        row.is_required = Set(definition.is_required);
        row.default_value = Set(definition.default_value);
        row.options = Set(definition.options);
        row.validation_rules = Set(definition.validation_rules);
        row.display_order = Set(display_order);
        if let Some(actor) = actor {
            row.updated_by = Set(Some(actor.to_string()));
        }
        row.updated_at = Set(Utc::now());

        let updated = self.repos.fields.update(&txn, row).await?;
        txn.commit().await.map_err(DbError::from)?;

        info!("Updated field '{}' ({})", updated.slug, updated.id);
        Ok(updated)
    }

    /// Delete a field that no stored value references
    pub async fn delete_field(&self, asset_type_id: &str, field_id: &str) -> SchemaResult<()> {
        let txn = self.repos.db().begin().await.map_err(DbError::from)?;
        self.require_field(&txn, asset_type_id, field_id).await?;

        let values_count = RecordProjector::new(self.repos)
            .delete_guard_in(&txn, field_id)
            .await?;
        if values_count > 0 {
            return Err(field_in_use(field_id, values_count));
        }

        // A value inserted after the guard trips the RESTRICT foreign key
        match self.repos.fields.delete(&txn, field_id).await {
            Ok(_) => {}
            Err(DbError::ForeignKeyViolation(_)) => return Err(field_in_use(field_id, 1)),
            Err(other) => return Err(other.into()),
        }
        txn.commit().await.map_err(DbError::from)?;

        info!("Deleted field {} from asset type {}", field_id, asset_type_id);
        Ok(())
    }
}
