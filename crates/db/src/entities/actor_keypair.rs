//! Actor keypair entity (RSA keys for `ActivityPub` signing).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Signing key pair for a local actor.
/// Each blog-backed actor has exactly one keypair; remote actors have none.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actor_keypair")]
pub struct Model {
    /// Same as actor.id (1:1 relationship)
    #[sea_orm(primary_key, auto_increment = false)]
    pub actor_id: String,

    /// RSA public key (PEM format)
    #[sea_orm(column_type = "Text")]
    pub public_key: String,

    /// RSA private key (PEM format)
    #[sea_orm(column_type = "Text")]
    pub private_key: String,

    /// Key ID (the actor's IRI + `#main-key`)
    pub key_id: String,

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
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
