use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::db::error::DbError;
use crate::entity::asset_field_values::{ActiveModel, Column, Entity as FieldValue, Model};

/// Repository for stored asset field values
#[derive(Clone, Default)]
pub struct FieldValueRepository;

impl FieldValueRepository {
    pub fn new() -> Self {
        Self
    }

    /// Number of values that reference a field definition
    pub async fn count_for_field<C: ConnectionTrait>(
        &self,
        conn: &C,
        field_id: &str,
    ) -> Result<u64, DbError> {
        FieldValue::find()
            .filter(Column::AssetTypeFieldId.eq(field_id))
            .count(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_for_asset<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_id: &str,
    ) -> Result<Vec<Model>, DbError> {
        FieldValue::find()
            .filter(Column::AssetId.eq(asset_id))
            .all(conn)
            .await
            .map_err(Into::into)
    }

    /// Insert or overwrite the value of one field on one asset
    pub async fn upsert<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_id: &str,
        field_id: &str,
        value: Option<String>,
    ) -> Result<Model, DbError> {
        let now = Utc::now();
        let existing = FieldValue::find()
            .filter(Column::AssetId.eq(asset_id))
            .filter(Column::AssetTypeFieldId.eq(field_id))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut active: ActiveModel = row.into();
                active.value = Set(value);
                active.updated_at = Set(now);
                active.update(conn).await.map_err(Into::into)
            }
            None => ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                asset_id: Set(asset_id.to_string()),
                asset_type_field_id: Set(field_id.to_string()),
                value: Set(value),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await
            .map_err(Into::into),
        }
    }
}
