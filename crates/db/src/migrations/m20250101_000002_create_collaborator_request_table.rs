//! Create `collaborator_request` table.
//!
//! At most one live (pending or approved) request per applicant is enforced
//! with a partial unique index; rejected requests do not occupy the slot, so
//! an applicant may re-apply after a rejection.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CollaboratorRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollaboratorRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::BankAccount)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::BankName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::CommissionRate)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::ApprovedBy)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::RejectionReason)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CollaboratorRequest::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(CollaboratorRequest::CommissionRate)
                            .gte(0.0)
                            .and(Expr::col(CollaboratorRequest::CommissionRate).lte(100.0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collaborator_request_user")
                            .from(CollaboratorRequest::Table, CollaboratorRequest::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_collaborator_request_approved_by")
                            .from(CollaboratorRequest::Table, CollaboratorRequest::ApprovedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, status) for the live-request lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_collaborator_request_user_status")
                    .table(CollaboratorRequest::Table)
                    .col(CollaboratorRequest::UserId)
                    .col(CollaboratorRequest::Status)
                    .to_owned(),
            )
            .await?;

        // Index: created_at for the admin listing
        manager
            .create_index(
                Index::create()
                    .name("idx_collaborator_request_created_at")
                    .table(CollaboratorRequest::Table)
                    .col(CollaboratorRequest::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // One live request per applicant
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS uq_collaborator_request_live_user
                ON collaborator_request (user_id)
                WHERE status IN ('pending', 'approved');
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(CollaboratorRequest::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum CollaboratorRequest {
    Table,
    Id,
    UserId,
    Status,
    BankAccount,
    BankName,
    CommissionRate,
    ApprovedBy,
    ApprovedAt,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
