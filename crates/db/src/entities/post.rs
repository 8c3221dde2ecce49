//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A blog post. The federation object representation is derived from this
/// row on demand and never persisted separately.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub blog_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content_html: String,

    /// Most recent publish time; NULL while the post is a draft.
    #[sea_orm(nullable)]
    pub published_at: Option<DateTimeWithTimeZone>,

    /// First time the post was published; never moves on re-publish.
    #[sea_orm(nullable)]
    pub first_published_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blog::Entity",
        from = "Column::BlogId",
        to = "super::blog::Column::Id",
        on_delete = "Cascade"
    )]
    Blog,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::blog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blog.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
