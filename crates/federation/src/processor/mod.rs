//! Activity processors for handling incoming `ActivityPub` activities.

#![allow(missing_docs)]

mod announce;
mod create;
mod delete;
mod emoji_react;
mod follow;
mod like;
mod undo;
mod update;

pub use announce::AnnounceProcessor;
pub use create::{CreateOutcome, CreateProcessor};
pub use delete::DeleteProcessor;
pub use emoji_react::EmojiReactProcessor;
pub use follow::{FollowOutcome, FollowProcessor};
pub use like::{LikeProcessor, ReactionOutcome};
pub use undo::{UndoOutcome, UndoProcessor};
pub use update::{UpdateOutcome, UpdateProcessor};
