use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One encoded value per (asset, field definition)
        manager
            .create_table(
                Table::create()
                    .table(AssetFieldValues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AssetFieldValues::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AssetFieldValues::AssetId).string().not_null())
                    .col(ColumnDef::new(AssetFieldValues::AssetTypeFieldId).string().not_null())
                    .col(ColumnDef::new(AssetFieldValues::Value).text())
                    .col(ColumnDef::new(AssetFieldValues::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(AssetFieldValues::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_field_values_asset")
                            .from(AssetFieldValues::Table, AssetFieldValues::AssetId)
                            .to(Assets::Table, Assets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // RESTRICT keeps a field definition alive while any value references it,
                    // even if a value is inserted after the service-level delete guard ran
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_asset_field_values_field")
                            .from(AssetFieldValues::Table, AssetFieldValues::AssetTypeFieldId)
                            .to(AssetTypeFields::Table, AssetTypeFields::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .unique()
                    .name("idx_asset_field_values_asset_field_unique")
                    .table(AssetFieldValues::Table)
                    .col(AssetFieldValues::AssetId)
                    .col(AssetFieldValues::AssetTypeFieldId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_asset_field_values_field_id")
                    .table(AssetFieldValues::Table)
                    .col(AssetFieldValues::AssetTypeFieldId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssetFieldValues::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AssetFieldValues {
    Table,
    Id,
    AssetId,
    AssetTypeFieldId,
    Value,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum AssetTypeFields {
    Table,
    Id,
}
