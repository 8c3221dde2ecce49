//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum NotificationType {
    #[sea_orm(string_value = "mention")]
    Mention,
    #[sea_orm(string_value = "quote")]
    Quote,
    #[sea_orm(string_value = "reply")]
    Reply,
    #[sea_orm(string_value = "announce")]
    Announce,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "emoji_react")]
    EmojiReact,
}

/// One row per externally observed reaction to a local post.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub notification_type: NotificationType,

    /// The remote actor who reacted.
    pub actor_id: String,

    /// IRI of the activity; used for idempotent delete on Undo.
    pub activity_iri: String,

    /// IRI of the reacted-to object.
    pub object_iri: String,

    /// The local post the reaction targets.
    pub post_id: String,

    /// Emoji glyph, or reply/quote body.
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    /// Link to the reacting object, when it has one.
    #[sea_orm(nullable)]
    pub url: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::ActorId",
        to = "super::actor::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,

    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
