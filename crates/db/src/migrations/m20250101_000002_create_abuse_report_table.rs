//! Create abuse report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AbuseReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AbuseReport::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AbuseReport::ReporterId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AbuseReport::ReportedUserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AbuseReport::Reason).string_len(200).not_null())
                    .col(ColumnDef::new(AbuseReport::Description).text().not_null())
                    .col(ColumnDef::new(AbuseReport::Attachments).json_binary().not_null())
                    .col(
                        ColumnDef::new(AbuseReport::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(AbuseReport::ClaimedBy).string_len(64))
                    .col(ColumnDef::new(AbuseReport::ClaimedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(AbuseReport::ResolutionAction).string_len(16))
                    .col(ColumnDef::new(AbuseReport::ResolutionDays).integer())
                    .col(ColumnDef::new(AbuseReport::ResolvedBy).string_len(64))
                    .col(ColumnDef::new(AbuseReport::ResolvedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(AbuseReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_abuse_report_reporter")
                            .from(AbuseReport::Table, AbuseReport::ReporterId)
                            .to(Account::Table, Account::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_abuse_report_reported_user")
                            .from(AbuseReport::Table, AbuseReport::ReportedUserId)
                            .to(Account::Table, Account::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (for the review queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_abuse_report_status")
                    .table(AbuseReport::Table)
                    .col(AbuseReport::Status)
                    .to_owned(),
            )
            .await?;

        // Index: reported_user_id (for per-user report history)
        manager
            .create_index(
                Index::create()
                    .name("idx_abuse_report_reported_user_id")
                    .table(AbuseReport::Table)
                    .col(AbuseReport::ReportedUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AbuseReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AbuseReport {
    Table,
    Id,
    ReporterId,
    ReportedUserId,
    Reason,
    Description,
    Attachments,
    Status,
    ClaimedBy,
    ClaimedAt,
    ResolutionAction,
    ResolutionDays,
    ResolvedBy,
    ResolvedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
