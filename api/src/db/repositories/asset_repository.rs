use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::db::error::DbError;
use crate::entity::assets::{ActiveModel, Column, Entity as Asset, Model};

/// Repository for asset instances
#[derive(Clone, Default)]
pub struct AssetRepository;

impl AssetRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> Result<Option<Model>, DbError> {
        Asset::find_by_id(id.to_string())
            .one(conn)
            .await
            .map_err(Into::into)
    }

    /// Number of assets currently typed as `asset_type_id`
    pub async fn count_by_asset_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        asset_type_id: &str,
    ) -> Result<u64, DbError> {
        Asset::find()
            .filter(Column::AssetTypeId.eq(asset_type_id))
            .count(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ActiveModel,
    ) -> Result<Model, DbError> {
        model.insert(conn).await.map_err(Into::into)
    }
}
