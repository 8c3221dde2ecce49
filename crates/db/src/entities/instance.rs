//! Instance entity for federation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Remote server in the federation network.
///
/// Upserted lazily on first contact with an actor from that host.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The hostname of this instance (unique identifier, never contains `@`).
    #[sea_orm(unique)]
    pub host: String,

    /// Software name detected via nodeinfo (e.g. "mastodon", "akkoma").
    #[sea_orm(nullable)]
    pub software_name: Option<String>,

    /// Software version, normalized to three numeric components.
    #[sea_orm(nullable)]
    pub software_version: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
