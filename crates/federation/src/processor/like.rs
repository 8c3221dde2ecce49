//! Like activity processor.

use chrono::Utc;
use letterpress_common::{AppResult, IdGenerator};
use letterpress_db::{
    entities::{notification, notification::NotificationType},
    repositories::{NotificationRepository, PostRepository},
};
use sea_orm::Set;
use tracing::info;

use crate::activities::LikeActivity;
use crate::convert::UrlConfig;
use crate::store::ActorStore;

/// Result of ingesting a reaction-style activity.
#[derive(Debug)]
pub enum ReactionOutcome {
    /// A notification row was recorded.
    Recorded(notification::Model),
    /// The activity was not applicable and was dropped.
    Skipped { reason: String },
}

/// Processor for Like activities.
#[derive(Clone)]
pub struct LikeProcessor {
    post_repo: PostRepository,
    notification_repo: NotificationRepository,
    store: ActorStore,
    urls: UrlConfig,
    id_gen: IdGenerator,
}

impl LikeProcessor {
    /// Create a new like processor.
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

    /// Process an incoming Like activity.
    pub async fn process(&self, activity: &LikeActivity) -> AppResult<ReactionOutcome> {
        info!(
            actor = %activity.actor,
            object = %activity.object,
            "Processing Like activity"
        );

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
            notification_type: Set(NotificationType::Like),
            actor_id: Set(actor.id.clone()),
            activity_iri: Set(activity.id.to_string()),
            object_iri: Set(activity.object.to_string()),
            post_id: Set(post.id),
            content: Set(None),
            url: Set(None),
            is_read: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let created = self.notification_repo.create(model).await?;

        info!(
            notification_id = %created.id,
            actor = %actor.handle(),
            "Recorded like notification"
        );

        Ok(ReactionOutcome::Recorded(created))
    }
}
