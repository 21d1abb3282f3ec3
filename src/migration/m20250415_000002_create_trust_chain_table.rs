use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrustChain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrustChain::EntityId)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrustChain::Data).binary().not_null())
                    .col(
                        ColumnDef::new(TrustChain::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrustChain::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TrustChain {
    Table,
    EntityId,
    Data,
    ExpiresAt,
}
