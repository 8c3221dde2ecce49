//! `EmojiReact` activity processor.
//!
//! Handles incoming `EmojiReact` activities from Pleroma/Akkoma/Misskey
//! instances.

use chrono::Utc;
use letterpress_common::{AppResult, IdGenerator};
use letterpress_db::{
    entities::{notification, notification::NotificationType},
    repositories::{NotificationRepository, PostRepository},
};
use sea_orm::Set;
use tracing::info;

use super::like::ReactionOutcome;
use crate::activities::EmojiReactActivity;
use crate::convert::UrlConfig;
use crate::store::ActorStore;

/// Processor for `EmojiReact` activities.
#[derive(Clone)]
pub struct EmojiReactProcessor {
    post_repo: PostRepository,
    notification_repo: NotificationRepository,
    store: ActorStore,
    urls: UrlConfig,
    id_gen: IdGenerator,
}

impl EmojiReactProcessor {
    /// Create a new `EmojiReact` processor.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        notification_repo: NotificationRepository,
        store: ActorStore,
        urls: UrlConfig,
    ) -> Self {
        Self {
            post_repo,
            notification_repo,
            store,
            urls,
            id_gen: IdGenerator::new(),
        }
    }

    /// Process an incoming `EmojiReact` activity.
    ///
    /// The recorded content is the emoji exactly as sent; a later Undo
    /// matches on the same value.
    pub async fn process(&self, activity: &EmojiReactActivity) -> AppResult<ReactionOutcome> {
        info!(
            actor = %activity.actor,
            object = %activity.object,
            content = %activity.content,
            "Processing EmojiReact activity"
        );

        let emoji = activity.content.trim();
        if emoji.is_empty() {
            return Ok(ReactionOutcome::Skipped {
                reason: "EmojiReact without content".to_string(),
            });
        }

        let Some(post_id) = self.urls.parse_object_iri(&activity.object) else {
            return Ok(ReactionOutcome::Skipped {
                reason: format!("Not a local object: {}", activity.object),
            });
        };

        let Some(post) = self.post_repo.find_by_id(&post_id).await? else {
            return Ok(ReactionOutcome::Skipped {
                reason: format!("Unknown post: {post_id}"),
            });
        };

        let Some(actor) = self.store.resolve_actor(&activity.actor).await? else {
            return Ok(ReactionOutcome::Skipped {
                reason: format!("Cannot resolve actor {}", activity.actor),
            });
        };

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            notification_type: Set(NotificationType::EmojiReact),
            actor_id: Set(actor.id.clone()),
            activity_iri: Set(activity.id.to_string()),
            object_iri: Set(activity.object.to_string()),
            post_id: Set(post.id),
            content: Set(Some(emoji.to_string())),
            url: Set(None),
            is_read: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let created = self.notification_repo.create(model).await?;

        info!(
            notification_id = %created.id,
            actor = %actor.handle(),
            emoji = %emoji,
            "Recorded emoji reaction notification"
        );

        Ok(ReactionOutcome::Recorded(created))
    }
}
