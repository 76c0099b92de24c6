use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Concrete asset instances; an asset type cannot be dropped while referenced
        manager
            .create_table(
                Table::create()
                    .table(Assets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Assets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Assets::AssetTypeId).string())
                    .col(ColumnDef::new(Assets::Label).string())
                    .col(ColumnDef::new(Assets::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(Assets::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assets_asset_type")
                            .from(Assets::Table, Assets::AssetTypeId)
                            .to(AssetTypes::Table, AssetTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_assets_asset_type_id")
                    .table(Assets::Table)
                    .col(Assets::AssetTypeId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Assets {
    Table,
    Id,
    AssetTypeId,
    Label,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssetTypes {
    Table,
    Id,
}
