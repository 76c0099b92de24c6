use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::db::error::DbError;
use crate::entity::field_types::{ActiveModel, Column, Entity as FieldType, Model};

/// Repository for the field type catalog
#[derive(Clone, Default)]
pub struct FieldTypeRepository;

impl FieldTypeRepository {
    pub fn new() -> Self {
        Self
    }

    /// All field types, oldest first with slug as tie-breaker
    pub async fn find_all<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<Model>, DbError> {
        FieldType::find()
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Slug)
            .all(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> Result<Option<Model>, DbError> {
        FieldType::find_by_id(id.to_string())
            .one(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_slug<C: ConnectionTrait>(
        &self,
        conn: &C,
        slug: &str,
    ) -> Result<Option<Model>, DbError> {
        FieldType::find()
            .filter(Column::Slug.eq(slug))
            .one(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn slug_exists<C: ConnectionTrait>(&self, conn: &C, slug: &str) -> Result<bool, DbError> {
        let count = FieldType::find()
            .filter(Column::Slug.eq(slug))
            .count(conn)
            .await?;
        Ok(count > 0)
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
}
