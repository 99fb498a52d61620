use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Dependent counts on user/platform delete scan these columns
        manager
            .create_index(
                Index::create()
                    .name("idx_shows_to_users_user_id")
                    .table(ShowsToUsers::Table)
                    .col(ShowsToUsers::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shows_platform_id")
                    .table(Shows::Table)
                    .col(Shows::PlatformId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_shows_to_users_user_id")
                    .table(ShowsToUsers::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_shows_platform_id")
                    .table(Shows::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ShowsToUsers {
    Table,
    UserId,
}

#[derive(DeriveIden)]
enum Shows {
    Table,
    PlatformId,
}
