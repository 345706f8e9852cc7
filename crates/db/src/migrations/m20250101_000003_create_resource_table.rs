//! Create resource table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resource::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resource::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Resource::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Resource::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Resource::Price).double().not_null().default(0.0))
                    .col(
                        ColumnDef::new(Resource::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_owner")
                            .from(Resource::Table, Resource::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id for per-collaborator aggregation
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_owner_id")
                    .table(Resource::Table)
                    .col(Resource::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Resource::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Resource {
    Table,
    Id,
    OwnerId,
    Title,
    Price,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
