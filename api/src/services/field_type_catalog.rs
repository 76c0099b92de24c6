// Field type catalog: default seeding, creation and lookups

use chrono::Utc;
use sea_orm::{Set, TransactionTrait};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{DbError, Repositories};
use crate::entity::field_types;
use crate::error::{SchemaError, SchemaResult};
use crate::services::field_validator::{validate_field_type_payload, FieldTypePayload};
use crate::services::slug::{resolve_unique, slugify, with_slug_retry, FieldTypeSlugs};
use crate::config::EngineSettings;

/// A built-in field type ensured on every catalog
#[derive(Debug, Clone)]
pub struct DefaultFieldType {
    pub slug: &'static str,
    pub name: &'static str,
    pub has_options: bool,
    pub description: Option<&'static str>,
    pub max_length: Option<u64>,
}

impl DefaultFieldType {
    fn rules(&self) -> Option<Value> {
        self.max_length.map(|n| json!({ "maxLength": n }))
    }
}

const fn default_type(
    slug: &'static str,
    name: &'static str,
    has_options: bool,
    description: Option<&'static str>,
    max_length: Option<u64>,
) -> DefaultFieldType {
    DefaultFieldType {
        slug,
        name,
        has_options,
        description,
        max_length,
    }
}

pub const DEFAULT_FIELD_TYPES: &[DefaultFieldType] = &[
    default_type("text", "Text", false, Some("Single-line string"), Some(255)),
    default_type("textarea", "Textarea", false, Some("Multi-line text"), Some(5000)),
    default_type("number", "Number", false, Some("Integer/float"), None),
    default_type("boolean", "Boolean", false, Some("True/False"), None),
    default_type("date", "Date", false, None, None),
    default_type("datetime", "Datetime", false, None, None),
    default_type("email", "Email", false, None, None),
    default_type("url", "URL", false, None, None),
    default_type("currency", "Currency", false, None, None),
    default_type("select", "Select", true, Some("One option from list"), None),
    default_type("multiselect", "Multi-Select", true, Some("Many options from list"), None),
];

pub struct FieldTypeCatalog<'a> {
    repos: &'a Repositories,
    settings: &'a EngineSettings,
}

impl<'a> FieldTypeCatalog<'a> {
    pub fn new(repos: &'a Repositories, settings: &'a EngineSettings) -> Self {
        Self { repos, settings }
    }

    /// Upsert the built-in types keyed by slug; rows are only written when they differ
    pub async fn ensure_defaults(&self) -> SchemaResult<Vec<field_types::Model>> {
        let txn = self.repos.db().begin().await.map_err(DbError::from)?;
        let repo = &self.repos.field_types;
        let mut written = 0usize;

        for default in DEFAULT_FIELD_TYPES {
            let now = Utc::now();
            match repo.find_by_slug(&txn, default.slug).await? {
                None => {
                    let row = field_types::ActiveModel {
                        id: Set(Uuid::new_v4().to_string()),
                        name: Set(default.name.to_string()),
                        slug: Set(default.slug.to_string()),
                        description: Set(default.description.map(str::to_string)),
                        has_options: Set(default.has_options),
                        validation_rules: Set(default.rules()),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    repo.insert(&txn, row).await?;
                    written += 1;
                }
                Some(existing) => {
                    // Defaults without rules leave custom rules alone; defaults with
                    // rules overlay their keys onto whatever is stored
                    let rules = match default.rules() {
                        None => existing.validation_rules.clone(),
                        Some(Value::Object(own)) => {
                            let mut merged = existing
                                .validation_rules
                                .as_ref()
                                .and_then(Value::as_object)
                                .cloned()
                                .unwrap_or_default();
                            merged.extend(own);
                            Some(Value::Object(merged))
                        }
                        Some(other) => Some(other),
                    };
                    let description = default.description.map(str::to_string);

                    let unchanged = existing.name == default.name
                        && existing.has_options == default.has_options
                        && existing.description == description
                        && existing.validation_rules == rules;
                    if unchanged {
                        continue;
                    }

                    let mut row: field_types::ActiveModel = existing.into();
                    row.name = Set(default.name.to_string());
                    row.has_options = Set(default.has_options);
                    row.description = Set(description);
                    row.validation_rules = Set(rules);
                    row.updated_at = Set(now);
                    repo.update(&txn, row).await?;
                    written += 1;
                }
            }
        }

        txn.commit().await.map_err(DbError::from)?;
        info!("Field type defaults ensured ({} rows written)", written);

        self.list().await
    }

    /// Create a catalog entry; a derived slug is suffixed on collision while an
    /// explicit slug must be free
    pub async fn create(&self, payload: &FieldTypePayload) -> SchemaResult<field_types::Model> {
        validate_field_type_payload(payload).into_result()?;

        with_slug_retry(self.settings.slug_retry_attempts, move || self.try_create(payload)).await
    }

    async fn try_create(&self, payload: &FieldTypePayload) -> SchemaResult<field_types::Model> {
        let repo = &self.repos.field_types;
        let name = payload.name_str().unwrap_or_default().to_string();
        let txn = self.repos.db().begin().await.map_err(DbError::from)?;

        let slug = match payload.slug_str() {
            Some(explicit) => {
                let slug = slugify(explicit);
                if repo.slug_exists(&txn, &slug).await? {
                    return Err(SchemaError::conflict(
                        "slug must be unique",
                        json!({ "slug": slug }),
                    ));
                }
                slug
            }
            None => resolve_unique(&FieldTypeSlugs::new(repo, &txn), &slugify(&name)).await?,
        };

        let now = Utc::now();
        let row = field_types::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            slug: Set(slug),
            description: Set(payload
                .description
                .as_ref()
                .and_then(Value::as_str)
                .map(str::to_string)),
            has_options: Set(payload
                .has_options
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false)),
            validation_rules: Set(payload.validation_rules.clone().filter(|r| !r.is_null())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = repo.insert(&txn, row).await?;
        txn.commit().await.map_err(DbError::from)?;

        info!("Created field type '{}' ({})", created.slug, created.id);
        Ok(created)
    }

    pub async fn list(&self) -> SchemaResult<Vec<field_types::Model>> {
        let rows = self.repos.field_types.find_all(self.repos.db()).await?;
        debug!("Listed {} field types", rows.len());
        Ok(rows)
    }

    pub async fn get(&self, id: &str) -> SchemaResult<field_types::Model> {
        self.repos
            .field_types
            .find_by_id(self.repos.db(), id)
            .await?
            .ok_or_else(|| SchemaError::not_found(format!("Field type {}", id)))
    }

    pub async fn find_by_slug(&self, slug: &str) -> SchemaResult<Option<field_types::Model>> {
        Ok(self
            .repos
            .field_types
            .find_by_slug(self.repos.db(), &slugify(slug))
            .await?)
    }
}
