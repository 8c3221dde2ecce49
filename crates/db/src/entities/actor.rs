//! Actor entity (local and remote federation participants).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `ActivityPub` actor types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ActorType {
    #[sea_orm(string_value = "Person")]
    Person,
    #[sea_orm(string_value = "Service")]
    Service,
    #[sea_orm(string_value = "Group")]
    Group,
    #[sea_orm(string_value = "Organization")]
    Organization,
    #[sea_orm(string_value = "Application")]
    Application,
}

impl ActorType {
    /// Parse an `ActivityPub` actor type string.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Person" => Some(Self::Person),
            "Service" => Some(Self::Service),
            "Group" => Some(Self::Group),
            "Organization" => Some(Self::Organization),
            "Application" => Some(Self::Application),
            _ => None,
        }
    }
}

/// One row per local-or-remote federation participant.
///
/// Local actors are backed by a blog (`blog_id` is set) and own a signing
/// keypair; remote actors are cached snapshots of another server's profile
/// document, refreshed on re-fetch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actor")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Canonical actor IRI (globally unique).
    #[sea_orm(unique)]
    pub iri: String,

    pub actor_type: ActorType,

    pub username: String,

    /// Host the actor lives on; unique together with `username`.
    pub instance_host: String,

    /// Host used in the `@username@host` handle (WebFinger canonical host,
    /// which may differ from `instance_host`).
    pub handle_host: String,

    /// Backing blog for local actors; NULL for remote actors.
    #[sea_orm(unique, nullable)]
    pub blog_id: Option<String>,

    /// Display name.
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Profile bio (sanitized HTML).
    #[sea_orm(column_type = "Text", nullable)]
    pub bio_html: Option<String>,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    #[sea_orm(nullable)]
    pub header_url: Option<String>,

    /// Profile page URL.
    #[sea_orm(nullable)]
    pub url: Option<String>,

    /// Profile field name → sanitized HTML value.
    #[sea_orm(column_type = "JsonBinary")]
    pub field_htmls: Json,

    /// Custom emoji shortcode → icon URL.
    #[sea_orm(column_type = "JsonBinary")]
    pub emojis: Json,

    /// Hashtag name (lowercased) → tag page URL.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    /// `alsoKnownAs` IRIs (actor migration aliases).
    #[sea_orm(column_type = "JsonBinary")]
    pub aliases: Json,

    pub inbox_url: String,

    #[sea_orm(nullable)]
    pub shared_inbox_url: Option<String>,

    #[sea_orm(nullable)]
    pub followers_url: Option<String>,

    #[sea_orm(nullable)]
    pub featured_url: Option<String>,

    /// Live-recomputed for local actors; cached snapshot for remote actors.
    #[sea_orm(default_value = 0)]
    pub followees_count: i32,

    #[sea_orm(default_value = 0)]
    pub followers_count: i32,

    #[sea_orm(default_value = 0)]
    pub posts_count: i32,

    /// Migration target, honored only when the successor lists this actor's
    /// IRI among its aliases.
    #[sea_orm(nullable)]
    pub successor_id: Option<String>,

    /// `published` timestamp from the actor document.
    #[sea_orm(nullable)]
    pub published_at: Option<DateTimeWithTimeZone>,

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

    #[sea_orm(has_one = "super::actor_keypair::Entity")]
    Keypair,
}

impl Related<super::blog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blog.def()
    }
}

impl Related<super::actor_keypair::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Keypair.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Human-readable `@username@host` handle.
    #[must_use]
    pub fn handle(&self) -> String {
        format!("@{}@{}", self.username, self.handle_host)
    }

    /// Whether this actor is backed by a local blog.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.blog_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_type_parse() {
        assert_eq!(ActorType::parse("Person"), Some(ActorType::Person));
        assert_eq!(ActorType::parse("Service"), Some(ActorType::Service));
        assert_eq!(ActorType::parse("Robot"), None);
    }
}
