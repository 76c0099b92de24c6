use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Catalog of reusable field primitives (text, number, select, ...)
        manager
            .create_table(
                Table::create()
                    .table(FieldTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FieldTypes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(FieldTypes::Name).string().not_null())
                    .col(ColumnDef::new(FieldTypes::Slug).string().not_null())
                    .col(ColumnDef::new(FieldTypes::Description).text())
                    .col(ColumnDef::new(FieldTypes::HasOptions).boolean().not_null().default(false))
                    .col(ColumnDef::new(FieldTypes::ValidationRules).json())
                    .col(ColumnDef::new(FieldTypes::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(FieldTypes::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Slugs are unique across the whole catalog
        manager
            .create_index(
                Index::create()
                    .name("idx_field_types_slug")
                    .table(FieldTypes::Table)
                    .col(FieldTypes::Slug)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FieldTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FieldTypes {
    Table,
    Id,
    Name,
    Slug,
    Description,
    HasOptions,
    ValidationRules,
    CreatedAt,
    UpdatedAt,
}
