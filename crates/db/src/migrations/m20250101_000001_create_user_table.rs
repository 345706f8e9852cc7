//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(User::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(User::Username).string_len(128).not_null())
                    .col(ColumnDef::new(User::Email).string_len(256).not_null())
                    .col(ColumnDef::new(User::Token).string_len(64))
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(User::IsActive).boolean().not_null().default(false))
                    .col(ColumnDef::new(User::IsApproved).boolean().not_null().default(false))
                    .col(ColumnDef::new(User::BankAccount).string_len(64))
                    .col(ColumnDef::new(User::BankName).string_len(128))
                    .col(ColumnDef::new(User::CommissionRate).double().not_null().default(0.0))
                    .col(ColumnDef::new(User::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(User::ApprovedBy).string_len(32))
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(User::UpdatedAt).timestamp_with_time_zone())
                    .check(
                        Expr::col(User::CommissionRate)
                            .gte(0.0)
                            .and(Expr::col(User::CommissionRate).lte(100.0)),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: username
        manager
            .create_index(
                Index::create()
                    .name("idx_user_username")
                    .table(User::Table)
                    .col(User::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: email
        manager
            .create_index(
                Index::create()
                    .name("idx_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: token
        manager
            .create_index(
                Index::create()
                    .name("idx_user_token")
                    .table(User::Table)
                    .col(User::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (role, is_approved) for the collaborator stats scan
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role_is_approved")
                    .table(User::Table)
                    .col(User::Role)
                    .col(User::IsApproved)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Username,
    Email,
    Token,
    Role,
    IsActive,
    IsApproved,
    BankAccount,
    BankName,
    CommissionRate,
    ApprovedAt,
    ApprovedBy,
    CreatedAt,
    UpdatedAt,
}
