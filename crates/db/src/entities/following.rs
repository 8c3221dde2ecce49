//! Following entity (follow edges between actors).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed follow edge, keyed by the inbound Follow activity's IRI.
///
/// The IRI primary key doubles as the idempotency key: a redelivered Follow
/// activity maps to the same row and is absorbed by the conflict-free insert.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "following")]
pub struct Model {
    /// IRI of the Follow activity that created this edge.
    #[sea_orm(primary_key, auto_increment = false)]
    pub iri: String,

    /// The actor who follows.
    pub follower_id: String,

    /// The actor being followed.
    pub followee_id: String,

    /// NULL until the local side emits an Accept; set to the Accept time.
    #[sea_orm(nullable)]
    pub accepted: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::FollowerId",
        to = "super::actor::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::actor::Entity",
        from = "Column::FolloweeId",
        to = "super::actor::Column::Id",
        on_delete = "Cascade"
    )]
    Followee,
}

impl ActiveModelBehavior for ActiveModel {}
