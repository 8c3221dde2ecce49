//! Create actor table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Actor::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Actor::Iri)
                            .string_len(1024)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Actor::ActorType).string_len(32).not_null())
                    .col(ColumnDef::new(Actor::Username).string_len(256).not_null())
                    .col(ColumnDef::new(Actor::InstanceHost).string_len(256).not_null())
                    .col(ColumnDef::new(Actor::HandleHost).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Actor::BlogId)
                            .string_len(32)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Actor::Name).string_len(256))
                    .col(ColumnDef::new(Actor::BioHtml).text())
                    .col(ColumnDef::new(Actor::AvatarUrl).string_len(1024))
                    .col(ColumnDef::new(Actor::HeaderUrl).string_len(1024))
                    .col(ColumnDef::new(Actor::Url).string_len(1024))
                    .col(ColumnDef::new(Actor::FieldHtmls).json_binary().not_null())
                    .col(ColumnDef::new(Actor::Emojis).json_binary().not_null())
                    .col(ColumnDef::new(Actor::Tags).json_binary().not_null())
                    .col(ColumnDef::new(Actor::Aliases).json_binary().not_null())
                    .col(ColumnDef::new(Actor::InboxUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Actor::SharedInboxUrl).string_len(1024))
                    .col(ColumnDef::new(Actor::FollowersUrl).string_len(1024))
                    .col(ColumnDef::new(Actor::FeaturedUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Actor::FolloweesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Actor::FollowersCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Actor::PostsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Actor::SuccessorId).string_len(32))
                    .col(ColumnDef::new(Actor::PublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Actor::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Actor::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_actor_blog")
                            .from(Actor::Table, Actor::BlogId)
                            .to(Blog::Table, Blog::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (username, instance_host) - one actor per handle
        manager
            .create_index(
                Index::create()
                    .name("idx_actor_username_host")
                    .table(Actor::Table)
                    .col(Actor::Username)
                    .col(Actor::InstanceHost)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: instance_host (per-host sweeps)
        manager
            .create_index(
                Index::create()
                    .name("idx_actor_instance_host")
                    .table(Actor::Table)
                    .col(Actor::InstanceHost)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Actor::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Actor {
    Table,
    Id,
    Iri,
    ActorType,
    Username,
    InstanceHost,
    HandleHost,
    BlogId,
    Name,
    BioHtml,
    AvatarUrl,
    HeaderUrl,
    Url,
    FieldHtmls,
    Emojis,
    Tags,
    Aliases,
    InboxUrl,
    SharedInboxUrl,
    FollowersUrl,
    FeaturedUrl,
    FolloweesCount,
    FollowersCount,
    PostsCount,
    SuccessorId,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Blog {
    Table,
    Id,
}
