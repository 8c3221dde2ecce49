//! Create activity processor.
//!
//! Classifies inbound Note/Article creations as quotes of or replies to
//! local posts.

use chrono::Utc;
use letterpress_common::{AppResult, IdGenerator};
use letterpress_db::{
    entities::{actor, notification, notification::NotificationType, post},
    repositories::{ActorRepository, NotificationRepository, PostRepository},
};
use sea_orm::Set;
use tracing::{debug, info};

use crate::activities::{CreateActivity, CreateObject};
use crate::convert::UrlConfig;
use crate::store::ActorStore;

/// Result of classifying a Create activity.
#[derive(Debug)]
pub enum CreateOutcome {
    /// The object quotes a local post.
    Quote(notification::Model),
    /// The object replies to a local post.
    Reply(notification::Model),
    /// The object does not reference a local post; dropped.
    Ignored,
}

/// Processor for Create activities.
#[derive(Clone)]
pub struct CreateProcessor {
    actor_repo: ActorRepository,
    post_repo: PostRepository,
    notification_repo: NotificationRepository,
    store: ActorStore,
    urls: UrlConfig,
    id_gen: IdGenerator,
}

impl CreateProcessor {
    /// Create a new create processor.
    #[must_use]
    pub fn new(
        actor_repo: ActorRepository,
        post_repo: PostRepository,
        notification_repo: NotificationRepository,
        store: ActorStore,
        urls: UrlConfig,
    ) -> Self {
        Self {
            actor_repo,
            post_repo,
            notification_repo,
            store,
            urls,
            id_gen: IdGenerator::new(),
        }
    }

    /// Process an incoming Create activity.
    ///
    /// A quote marker wins over a reply target when both are present.
    pub async fn process(&self, activity: &CreateActivity) -> AppResult<CreateOutcome> {
        info!(
            actor = %activity.actor,
            object = %activity.object.id,
            "Processing Create activity"
        );

        let object = &activity.object;

        if let Some(quoted) = &object.quote_url {
            if let Some(post) = self.find_local_post(quoted).await? {
                let Some(actor) = self.store.resolve_actor(&activity.actor).await? else {
                    return Ok(CreateOutcome::Ignored);
                };
                let created = self
                    .record(NotificationType::Quote, object, &actor, &post)
                    .await?;
                return Ok(CreateOutcome::Quote(created));
            }
        }

        if let Some(reply_target) = &object.in_reply_to {
            if let Some(post) = self.find_local_post(reply_target).await? {
                let Some(actor) = self.store.resolve_actor(&activity.actor).await? else {
                    return Ok(CreateOutcome::Ignored);
                };

                // Mention tags name additional in-scope local targets; they
                // are resolved here but not recorded separately.
                let mentioned = self.resolve_local_mentions(object).await?;
                if !mentioned.is_empty() {
                    debug!(
                        mentions = mentioned.len(),
                        object = %object.id,
                        "Reply mentions local actors"
                    );
                }

                let created = self
                    .record(NotificationType::Reply, object, &actor, &post)
                    .await?;
                return Ok(CreateOutcome::Reply(created));
            }
        }

        Ok(CreateOutcome::Ignored)
    }

    async fn find_local_post(&self, iri: &url::Url) -> AppResult<Option<post::Model>> {
        let Some(post_id) = self.urls.parse_object_iri(iri) else {
            return Ok(None);
        };
        self.post_repo.find_by_id(&post_id).await
    }

    async fn record(
        &self,
        notification_type: NotificationType,
        object: &CreateObject,
        actor: &actor::Model,
        post: &post::Model,
    ) -> AppResult<notification::Model> {
        let url = object
            .url
            .as_ref()
            .map_or_else(|| object.id.to_string(), ToString::to_string);

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            notification_type: Set(notification_type),
            actor_id: Set(actor.id.clone()),
            activity_iri: Set(object.id.to_string()),
            object_iri: Set(object.id.to_string()),
            post_id: Set(post.id.clone()),
            content: Set(object.content.clone()),
            url: Set(Some(url)),
            is_read: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let created = self.notification_repo.create(model).await?;

        info!(
            notification_id = %created.id,
            actor = %actor.handle(),
            post = %post.id,
            "Recorded notification from Create"
        );

        Ok(created)
    }

    /// Resolve Mention tag hrefs against persisted local actors.
    async fn resolve_local_mentions(&self, object: &CreateObject) -> AppResult<Vec<actor::Model>> {
        let mut mentioned = Vec::new();
        for href in object.mention_hrefs() {
            if !self.urls.is_local(href) {
                continue;
            }
            if let Some(actor) = self.actor_repo.find_by_iri(href.as_str()).await? {
                if actor.is_local() {
                    mentioned.push(actor);
                }
            }
        }
        Ok(mentioned)
    }
}
