//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::ActorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Notification::ActivityIri)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::ObjectIri)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Notification::Content).text())
                    .col(ColumnDef::new(Notification::Url).string_len(1024))
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_actor")
                            .from(Notification::Table, Notification::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_post")
                            .from(Notification::Table, Notification::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: post_id (dashboard listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_post_id")
                    .table(Notification::Table)
                    .col(Notification::PostId)
                    .to_owned(),
            )
            .await?;

        // Index: object_iri (blanket cleanup on remote Delete)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_object_iri")
                    .table(Notification::Table)
                    .col(Notification::ObjectIri)
                    .to_owned(),
            )
            .await?;

        // Index: activity_iri (Undo by bare activity reference)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_activity_iri")
                    .table(Notification::Table)
                    .col(Notification::ActivityIri)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    NotificationType,
    ActorId,
    ActivityIri,
    ObjectIri,
    PostId,
    Content,
    Url,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
