//! Axum handlers for the federation surface.

#![allow(missing_docs)]

mod actor;
mod collections;
mod inbox;
mod nodeinfo;
mod webfinger;

pub use actor::{ActorDocState, actor_handler};
pub use collections::{CollectionState, followers_handler, following_handler, outbox_handler};
pub use inbox::{InboxActivity, InboxState, inbox_handler, user_inbox_handler};
pub use nodeinfo::{NodeInfoState, nodeinfo_2_1, well_known_nodeinfo};
pub use webfinger::{WebfingerState, webfinger_handler};
