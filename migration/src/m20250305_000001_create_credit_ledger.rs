use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 积分流水表
        manager
            .create_table(
                Table::create()
                    .table(CreditTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditTransactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditTransactions::UserId).big_integer().null())
                    .col(
                        ColumnDef::new(CreditTransactions::SubmissionId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CreditTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(CreditTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreditTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreditTransactions::Description).text().null())
                    .col(
                        ColumnDef::new(CreditTransactions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CreditTransactions::Table, CreditTransactions::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 审计日志表
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::ActorId).big_integer().null())
                    .col(ColumnDef::new(AuditLogs::OrganizationId).big_integer().null())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::TargetType).string().not_null())
                    .col(ColumnDef::new(AuditLogs::TargetId).big_integer().null())
                    .col(ColumnDef::new(AuditLogs::Details).text().null())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string().null())
                    .col(ColumnDef::new(AuditLogs::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_credit_transactions_org_created")
                    .table(CreditTransactions::Table)
                    .col(CreditTransactions::OrganizationId)
                    .col(CreditTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_logs_org_created")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::OrganizationId)
                    .col(AuditLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditTransactions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Organizations {
    #[sea_orm(iden = "organizations")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CreditTransactions {
    #[sea_orm(iden = "credit_transactions")]
    Table,
    Id,
    OrganizationId,
    UserId,
    SubmissionId,
    Kind,
    Amount,
    BalanceAfter,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    #[sea_orm(iden = "audit_logs")]
    Table,
    Id,
    ActorId,
    OrganizationId,
    Action,
    TargetType,
    TargetId,
    Details,
    IpAddress,
    CreatedAt,
}
