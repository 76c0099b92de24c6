//! SeaORM Entity for asset_type_fields, the per-type field definitions

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_type_fields")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub asset_type_id: String,
    pub field_type_id: String,
    pub name: String,
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_required: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub default_value: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub options: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub validation_rules: Option<Json>,
    pub display_order: i32,
    #[sea_orm(nullable)]
    pub created_by: Option<String>,
    #[sea_orm(nullable)]
    pub updated_by: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset_types::Entity",
        from = "Column::AssetTypeId",
        to = "super::asset_types::Column::Id",
        on_delete = "Cascade"
    )]
    AssetType,
    #[sea_orm(
        belongs_to = "super::field_types::Entity",
        from = "Column::FieldTypeId",
        to = "super::field_types::Column::Id",
        on_delete = "Restrict"
    )]
    FieldType,
    #[sea_orm(has_many = "super::asset_field_values::Entity")]
    Values,
}

impl Related<super::asset_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetType.def()
    }
}

impl Related<super::field_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FieldType.def()
    }
}

impl Related<super::asset_field_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Values.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Options as plain strings, in stored order
    pub fn option_list(&self) -> Vec<String> {
        self.options
            .as_ref()
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A single named constraint from `validation_rules`
    pub fn rule(&self, key: &str) -> Option<&Json> {
        self.validation_rules.as_ref().and_then(|rules| rules.get(key))
    }
}
