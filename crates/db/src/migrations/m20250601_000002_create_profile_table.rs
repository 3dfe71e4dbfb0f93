//! Create profile table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profile::Username).string_len(64).not_null())
                    .col(ColumnDef::new(Profile::UsernameLower).string_len(64).not_null())
                    .col(ColumnDef::new(Profile::DisplayName).string_len(128).not_null())
                    .col(ColumnDef::new(Profile::Bio).text())
                    .col(ColumnDef::new(Profile::AvatarUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Profile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Profile::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_account")
                            .from(Profile::Table, Profile::Id)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: username_lower - case-insensitive handle uniqueness
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_username_lower")
                    .table(Profile::Table)
                    .col(Profile::UsernameLower)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: created_at (stable search ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_profile_created_at")
                    .table(Profile::Table)
                    .col(Profile::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profile::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Profile {
    Table,
    Id,
    Username,
    UsernameLower,
    DisplayName,
    Bio,
    AvatarUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
