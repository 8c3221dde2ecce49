//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::BlogId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Post::ContentHtml).text().not_null())
                    .col(ColumnDef::new(Post::PublishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Post::FirstPublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_blog")
                            .from(Post::Table, Post::BlogId)
                            .to(Blog::Table, Blog::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (blog_id, published_at) for outbox listing
        manager
            .create_index(
                Index::create()
                    .name("idx_post_blog_published")
                    .table(Post::Table)
                    .col(Post::BlogId)
                    .col(Post::PublishedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    BlogId,
    Title,
    ContentHtml,
    PublishedAt,
    FirstPublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Blog {
    Table,
    Id,
}
