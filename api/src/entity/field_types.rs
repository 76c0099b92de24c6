//! SeaORM Entity for the field_types catalog

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "field_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub has_options: bool,
    #[sea_orm(column_type = "Json", nullable)]
    pub validation_rules: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::asset_type_fields::Entity")]
    AssetTypeFields,
}

impl Related<super::asset_type_fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetTypeFields.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Integer/number rule from `validation_rules`, e.g. `maxLength`
    pub fn rule_u64(&self, key: &str) -> Option<u64> {
        self.validation_rules
            .as_ref()
            .and_then(|rules| rules.get(key))
            .and_then(|v| v.as_u64())
    }
}
