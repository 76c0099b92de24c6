use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssetTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AssetTypes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(AssetTypes::Name).string().not_null())
                    .col(ColumnDef::new(AssetTypes::ImageUrl).string())
                    .col(ColumnDef::new(AssetTypes::CreatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .col(ColumnDef::new(AssetTypes::UpdatedAt).timestamp_with_time_zone().not_null().default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_asset_types_name")
                    .table(AssetTypes::Table)
                    .col(AssetTypes::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AssetTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AssetTypes {
    Table,
    Id,
    Name,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}
