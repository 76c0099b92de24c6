use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::db::error::DbError;
use crate::entity::asset_type_fields;
use crate::entity::asset_types::{ActiveModel, Column, Entity as AssetType, Model};

/// Repository for asset type rows
#[derive(Clone, Default)]
pub struct AssetTypeRepository;

impl AssetTypeRepository {
    pub fn new() -> Self {
        Self
    }

    /// Asset types ordered by name, optionally filtered by a case-insensitive name fragment
    pub async fn find_all<C: ConnectionTrait>(
        &self,
        conn: &C,
        name_filter: Option<&str>,
    ) -> Result<Vec<Model>, DbError> {
        let mut query = AssetType::find();

        if let Some(fragment) = name_filter.map(str::trim).filter(|f| !f.is_empty()) {
            let pattern = format!("%{}%", fragment.to_lowercase());
            query = query.filter(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern));
        }

        query
            .order_by_asc(Column::Name)
            .all(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> Result<Option<Model>, DbError> {
        AssetType::find_by_id(id.to_string())
            .one(conn)
            .await
            .map_err(Into::into)
    }

    /// Number of field definitions per asset type id
    pub async fn field_counts<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<HashMap<String, i64>, DbError> {
        let rows: Vec<(String, i64)> = asset_type_fields::Entity::find()
            .select_only()
            .column(asset_type_fields::Column::AssetTypeId)
            .column_as(asset_type_fields::Column::Id.count(), "field_count")
            .group_by(asset_type_fields::Column::AssetTypeId)
            .into_tuple()
            .all(conn)
            .await?;

        Ok(rows.into_iter().collect())
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
        let result = AssetType::delete_by_id(id.to_string()).exec(conn).await?;
        Ok(result.rows_affected)
    }
}
