// Asset type registry and asset instance registration

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::db::{DbError, Repositories};
use crate::entity::{asset_types, assets};
use crate::error::{SchemaError, SchemaResult};

/// Asset type with the number of fields it defines
#[derive(Debug, Clone, Serialize)]
pub struct AssetTypeSummary {
    #[serde(flatten)]
    pub asset_type: asset_types::Model,
    pub field_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetTypeInput {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

fn required_name(name: Option<&str>) -> SchemaResult<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SchemaError::Validation(vec!["name is required".to_string()]))
}

fn clean_url(url: Option<&str>) -> Option<String> {
    url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string)
}

fn assets_remain(asset_count: u64) -> SchemaError {
    SchemaError::conflict(
        "Reassign or remove assets first",
        json!({ "asset_count": asset_count }),
    )
}

pub struct AssetTypeService<'a> {
    repos: &'a Repositories,
}

impl<'a> AssetTypeService<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    pub async fn create(&self, input: &AssetTypeInput) -> SchemaResult<asset_types::Model> {
        let name = required_name(input.name.as_deref())?;
        let now = Utc::now();
        let model = asset_types::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            image_url: Set(clean_url(input.image_url.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = self.repos.asset_types.insert(self.repos.db(), model).await?;
        info!("Created asset type {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn list(&self, query: Option<&str>) -> SchemaResult<Vec<AssetTypeSummary>> {
        let conn = self.repos.db();
        let types = self.repos.asset_types.find_all(conn, query).await?;
        let counts = self.repos.asset_types.field_counts(conn).await?;

        Ok(types
            .into_iter()
            .map(|asset_type| {
                let field_count = counts.get(&asset_type.id).copied().unwrap_or(0);
                AssetTypeSummary {
                    asset_type,
                    field_count,
                }
            })
            .collect())
    }

    pub async fn get(&self, id: &str) -> SchemaResult<asset_types::Model> {
        self.repos
            .asset_types
            .find_by_id(self.repos.db(), id)
            .await?
            .ok_or_else(|| SchemaError::not_found(format!("Asset type {}", id)))
    }

    /// Absent attributes are kept; an empty image url clears it
    pub async fn update(&self, id: &str, input: &AssetTypeInput) -> SchemaResult<asset_types::Model> {
        let current = self.get(id).await?;
        let mut model: asset_types::ActiveModel = current.into();

        if input.name.is_some() {
            model.name = Set(required_name(input.name.as_deref())?);
        }
        if let Some(url) = input.image_url.as_deref() {
            model.image_url = Set(clean_url(Some(url)));
        }
        if !model.is_changed() {
            return self.get(id).await;
        }
        model.updated_at = Set(Utc::now());

        Ok(self.repos.asset_types.update(self.repos.db(), model).await?)
    }

    pub async fn delete(&self, id: &str) -> SchemaResult<()> {
        let conn = self.repos.db();
        self.get(id).await?;

        let asset_count = self.repos.assets.count_by_asset_type(conn, id).await?;
        if asset_count > 0 {
            return Err(assets_remain(asset_count));
        }

        match self.repos.asset_types.delete(conn, id).await {
            Ok(0) => Err(SchemaError::not_found(format!("Asset type {}", id))),
            Ok(_) => {
                info!("Deleted asset type {}", id);
                Ok(())
            }
            // An asset registered after the count still holds the RESTRICT key
            Err(DbError::ForeignKeyViolation(_)) => Err(assets_remain(1)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn register_asset(
        &self,
        asset_type_id: &str,
        label: Option<&str>,
    ) -> SchemaResult<assets::Model> {
        self.get(asset_type_id).await?;
        let now = Utc::now();
        let model = assets::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            asset_type_id: Set(Some(asset_type_id.to_string())),
            label: Set(label.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(self.repos.assets.insert(self.repos.db(), model).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        for name in [None, Some(""), Some("   ")] {
            let err = required_name(name).unwrap_err();
            assert_eq!(err.messages(), vec!["name is required"]);
        }
        assert_eq!(required_name(Some("  Laptop ")).unwrap(), "Laptop");
    }

    #[test]
    fn asset_conflict_carries_count() {
        match assets_remain(3) {
            SchemaError::Conflict { message, details } => {
                assert_eq!(message, "Reassign or remove assets first");
                assert_eq!(details, json!({ "asset_count": 3 }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
