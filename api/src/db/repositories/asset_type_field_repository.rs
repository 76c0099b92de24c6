use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::db::error::DbError;
use crate::entity::asset_type_fields::{ActiveModel, Column, Entity as AssetTypeField, Model};
use crate::entity::field_types;

/// Repository for field definitions attached to asset types
#[derive(Clone, Default)]
pub struct AssetTypeFieldRepository;

impl AssetTypeFieldRepository {
    pub fn new() -> Self {
        Self
    }

    /// Fields of one asset type joined with their field type, in display order
    pub async fn find_with_types<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: &str,
    ) -> Result<Vec<(Model, Option<field_types::Model>)>, DbError> {
        AssetTypeField::find()
            .find_also_related(field_types::Entity)
            .filter(Column::AssetTypeId.eq(asset_type_id))
            .order_by_asc(Column::DisplayOrder)
            .order_by_asc(Column::CreatedAt)
            .all(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> Result<Option<Model>, DbError> {
        AssetTypeField::find_by_id(id.to_string())
            .one(conn)
            .await
            .map_err(Into::into)
    }

    /// Whether `slug` is used by a field of the asset type other than `exclude_id`
    pub async fn slug_taken<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: &str,
        slug: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let mut query = AssetTypeField::find()
            .filter(Column::AssetTypeId.eq(asset_type_id))
            .filter(Column::Slug.eq(slug));

        if let Some(id) = exclude_id {
            query = query.filter(Column::Id.ne(id));
        }

        Ok(query.count(conn).await? > 0)
    }

    /// Highest display_order in use, `None` when the type has no fields
    pub async fn max_display_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: &str,
    ) -> Result<Option<i32>, DbError> {
        let max: Option<Option<i32>> = AssetTypeField::find()
            .select_only()
            .column_as(Column::DisplayOrder.max(), "max_order")
            .filter(Column::AssetTypeId.eq(asset_type_id))
            .into_tuple()
            .one(conn)
            .await?;

        Ok(max.flatten())
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ActiveModel,
    ) -> Result<Model, DbError> {
        model.insert(conn).await.map_err(Into::into)
    }

    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ActiveModel,
    ) -> Result<Model, DbError> {
        model.update(conn).await.map_err(Into::into)
    }

    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> Result<u64, DbError> {
        let result = AssetTypeField::delete_by_id(id.to_string())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
