//! `ActivityPub` activity types.

#![allow(missing_docs)]

mod accept;
mod announce;
mod create;
mod delete;
mod emoji_react;
mod follow;
mod like;
mod undo;
mod update;

pub use accept::AcceptActivity;
pub use announce::AnnounceActivity;
pub use create::{CreateActivity, CreateObject, ObjectKind, ObjectTag, TagIcon};
pub use delete::{DeleteActivity, DeleteObject};
pub use emoji_react::{EmojiReactActivity, EmojiReactType};
pub use follow::FollowActivity;
pub use like::LikeActivity;
pub use undo::{EmbeddedActivity, UndoActivity, UndoObject};
pub use update::UpdateActivity;
