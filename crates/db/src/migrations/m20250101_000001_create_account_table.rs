//! Create account table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Account::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Account::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Account::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Account::SuspensionExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Account::StatusReason).text())
                    .col(ColumnDef::new(Account::StatusChangedBy).string_len(64))
                    .col(ColumnDef::new(Account::StatusChangedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Account::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (for listing suspended/deactivated accounts)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_status")
                    .table(Account::Table)
                    .col(Account::Status)
                    .to_owned(),
            )
            .await?;

        // Index: suspension_expires_at (for the expiry sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_account_suspension_expires_at")
                    .table(Account::Table)
                    .col(Account::SuspensionExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
    Role,
    Status,
    SuspensionExpiresAt,
    StatusReason,
    StatusChangedBy,
    StatusChangedAt,
    Version,
    CreatedAt,
}
