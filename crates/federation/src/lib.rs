//! ActivityPub federation for letterpress.
//!
//! Each blog exposes itself as an `ActivityPub` actor. This crate implements
//! the federation core:
//!
//! - **Activities**: Follow, Undo, Create, Update, Delete, Announce, Like,
//!   EmojiReact
//! - **Actor store**: unified local/remote actor resolution and caching
//! - **Instance registry**: per-host software discovery via nodeinfo
//! - **Signatures**: HTTP Signatures (draft-cavage) for inbound verification
//!   and outbound signing
//! - **Processors**: inbound activity classification into follow edges and
//!   notifications
//! - **Broadcast**: outbound Create/Update/Delete delivery to follower
//!   inboxes
//! - **Handlers**: WebFinger, `NodeInfo`, actor documents, collections,
//!   inboxes

pub mod activities;
pub mod broadcast;
pub mod client;
pub mod convert;
pub mod handler;
pub mod instance;
pub mod processor;
pub mod signature;
pub mod store;
pub mod verify;

pub use activities::*;
pub use broadcast::{Broadcaster, PostAction};
pub use client::{ApClient, ApClientError, NodeInfoSoftware};
pub use convert::{UrlConfig, actor_to_person, post_to_article, wrap_post_activity};
pub use handler::*;
pub use instance::InstanceService;
pub use processor::{
    AnnounceProcessor, CreateOutcome, CreateProcessor, DeleteProcessor, EmojiReactProcessor,
    FollowOutcome, FollowProcessor, LikeProcessor, ReactionOutcome, UndoOutcome, UndoProcessor,
    UpdateProcessor,
};
pub use signature::{HttpSigner, HttpVerifier, SignatureComponents, SignatureError};
pub use store::ActorStore;
pub use verify::RequestVerifier;
