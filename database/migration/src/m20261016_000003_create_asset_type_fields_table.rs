use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Field definitions bound to one asset type
        manager
            .create_table(
                Table::create()
                    .table(AssetTypeFields::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AssetTypeFields::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AssetTypeFields::AssetTypeId).string().not_null())
                    .col(ColumnDef::new(AssetTypeFields::FieldTypeId).string().not_null())
                    .col(ColumnDef::new(AssetTypeFields::Name).string().not_null())
                    .col(ColumnDef::new(AssetTypeFields::Slug).string().not_null())
                    .col(ColumnDef::new(AssetTypeFields::Description).text())
                    .col(ColumnDef::new(AssetTypeFields::IsRequired).boolean().not_null().default(false))
                    .col(ColumnDef::new(AssetTypeFields::DefaultValue).text())
                    .col(ColumnDef::new(AssetTypeFields::Options).json())
                    .col(ColumnDef::new(AssetTypeFields::ValidationRules).json())
                    .col(ColumnDef::new(AssetTypeFields::DisplayOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(AssetTypeFields::CreatedBy).string())
                    .col(ColumnDef::new(AssetTypeFields::UpdatedBy).string())
                    .col(ColumnDef::new(AssetTypeFields::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(AssetTypeFields::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_type_fields_asset_type")
                            .from(AssetTypeFields::Table, AssetTypeFields::AssetTypeId)
                            .to(AssetTypes::Table, AssetTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_type_fields_field_type")
                            .from(AssetTypeFields::Table, AssetTypeFields::FieldTypeId)
                            .to(FieldTypes::Table, FieldTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Slugs are only unique within the owning asset type
        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("idx_asset_type_fields_type_slug_unique")
                    .table(AssetTypeFields::Table)
                    .col(AssetTypeFields::AssetTypeId)
                    .col(AssetTypeFields::Slug)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_asset_type_fields_field_type_id")
                    .table(AssetTypeFields::Table)
                    .col(AssetTypeFields::FieldTypeId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssetTypeFields::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AssetTypeFields {
    Table,
    Id,
    AssetTypeId,
    FieldTypeId,
    Name,
    Slug,
    Description,
    IsRequired,
    DefaultValue,
    Options,
    ValidationRules,
    DisplayOrder,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssetTypes {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum FieldTypes {
    Table,
    Id,
}
