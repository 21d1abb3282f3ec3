use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RpSession::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RpSession::Id)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RpSession::Data).binary().not_null())
                    .col(ColumnDef::new(RpSession::Nonce).text().not_null())
                    .col(ColumnDef::new(RpSession::State).text().null())
                    .col(
                        ColumnDef::new(RpSession::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The response leg is looked up by nonce, never by primary key.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_rp_session_nonce")
                    .table(RpSession::Table)
                    .col(RpSession::Nonce)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RpSession::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RpSession {
    Table,
    Id,
    Data,
    Nonce,
    State,
    CreatedAt,
}
