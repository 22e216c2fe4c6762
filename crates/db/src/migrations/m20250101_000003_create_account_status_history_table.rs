//! Create account status history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountStatusHistory::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccountStatusHistory::UserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountStatusHistory::FromStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountStatusHistory::ToStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountStatusHistory::Reason).text())
                    .col(
                        ColumnDef::new(AccountStatusHistory::ChangedBy)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountStatusHistory::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccountStatusHistory::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AccountStatusHistory::ReportId).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_status_history_user")
                            .from(AccountStatusHistory::Table, AccountStatusHistory::UserId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, changed_at) for per-account history
        manager
            .create_index(
                Index::create()
                    .name("idx_account_status_history_user_changed")
                    .table(AccountStatusHistory::Table)
                    .col(AccountStatusHistory::UserId)
                    .col(AccountStatusHistory::ChangedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountStatusHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AccountStatusHistory {
    Table,
    Id,
    UserId,
    FromStatus,
    ToStatus,
    Reason,
    ChangedBy,
    ChangedAt,
    ExpiresAt,
    ReportId,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
