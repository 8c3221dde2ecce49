//! Undo activity processor.
//!
//! Matching is always against recorded IRIs: remote Undo activities arrive
//! asynchronously and may reference objects no longer fetchable, so nothing
//! here re-resolves the undone object over the network.

use letterpress_common::AppResult;
use letterpress_db::{
    entities::{actor, notification::NotificationType},
    repositories::{ActorRepository, FollowingRepository, NotificationRepository},
};
use tracing::info;
use url::Url;

use crate::activities::{EmbeddedActivity, UndoActivity, UndoObject};
use crate::convert::UrlConfig;
use crate::store::ActorStore;

/// Result of processing an Undo activity.
#[derive(Debug)]
pub enum UndoOutcome {
    /// A follow edge was removed.
    Unfollowed,
    /// Reaction notifications were removed.
    NotificationsRemoved(u64),
    /// Nothing matched; the activity is dropped.
    Ignored,
}

/// Processor for Undo activities.
#[derive(Clone)]
pub struct UndoProcessor {
    actor_repo: ActorRepository,
    following_repo: FollowingRepository,
    notification_repo: NotificationRepository,
    store: ActorStore,
    urls: UrlConfig,
}

impl UndoProcessor {
    /// Create a new undo processor.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        following_repo: FollowingRepository,
        notification_repo: NotificationRepository,
        store: ActorStore,
        urls: UrlConfig,
    ) -> Self {
        Self {
            actor_repo,
            following_repo,
            notification_repo,
            store,
            urls,
        }
    }

    /// Process an incoming Undo activity.
    pub async fn process(&self, activity: &UndoActivity) -> AppResult<UndoOutcome> {
        info!(actor = %activity.actor, "Processing Undo activity");

        let Some(actor) = self.store.resolve_actor(&activity.actor).await? else {
            return Ok(UndoOutcome::Ignored);
        };

        match &activity.object {
            UndoObject::Embedded(inner) => self.undo_embedded(inner, &actor).await,
            UndoObject::Reference(iri) => self.undo_reference(iri, &actor).await,
        }
    }

    async fn undo_embedded(
        &self,
        inner: &EmbeddedActivity,
        actor: &actor::Model,
    ) -> AppResult<UndoOutcome> {
        match inner.kind.as_str() {
            "Follow" => self.undo_follow(&inner.id, actor).await,
            "Like" => {
                let Some(post_id) = self.local_post_id(inner) else {
                    return Ok(UndoOutcome::Ignored);
                };
                let removed = self
                    .notification_repo
                    .delete_matching(NotificationType::Like, &post_id, &actor.id, None)
                    .await?;
                Ok(UndoOutcome::NotificationsRemoved(removed))
            }
            "Announce" => {
                let Some(post_id) = self.local_post_id(inner) else {
                    return Ok(UndoOutcome::Ignored);
                };
                let removed = self
                    .notification_repo
                    .delete_matching(NotificationType::Announce, &post_id, &actor.id, Some(""))
                    .await?;
                Ok(UndoOutcome::NotificationsRemoved(removed))
            }
            "EmojiReact" => {
                let Some(post_id) = self.local_post_id(inner) else {
                    return Ok(UndoOutcome::Ignored);
                };
                // The same emoji keys the match; an undo without content can
                // still land via the recorded activity IRI.
                let removed = match inner.content.as_deref() {
                    Some(emoji) => {
                        self.notification_repo
                            .delete_matching(
                                NotificationType::EmojiReact,
                                &post_id,
                                &actor.id,
                                Some(emoji),
                            )
                            .await?
                    }
                    None => {
                        self.notification_repo
                            .delete_by_activity(inner.id.as_str(), &actor.id)
                            .await?
                    }
                };
                Ok(UndoOutcome::NotificationsRemoved(removed))
            }
            other => {
                info!(object_type = %other, "Unknown Undo object type, ignoring");
                Ok(UndoOutcome::Ignored)
            }
        }
    }

    /// Undo carrying only the undone activity's IRI: try the follow edge,
    /// then any notification recorded under that activity.
    async fn undo_reference(&self, iri: &Url, actor: &actor::Model) -> AppResult<UndoOutcome> {
        if let outcome @ UndoOutcome::Unfollowed = self.undo_follow(iri, actor).await? {
            return Ok(outcome);
        }

        let removed = self
            .notification_repo
            .delete_by_activity(iri.as_str(), &actor.id)
            .await?;

        if removed > 0 {
            Ok(UndoOutcome::NotificationsRemoved(removed))
        } else {
            Ok(UndoOutcome::Ignored)
        }
    }

    /// Remove a follow edge by its original activity IRI and follower.
    ///
    /// Pending and accepted follows are symmetric on removal; both sides'
    /// counters are updated either way.
    async fn undo_follow(&self, follow_iri: &Url, actor: &actor::Model) -> AppResult<UndoOutcome> {
        let Some(edge) = self
            .following_repo
            .find_by_iri_and_follower(follow_iri.as_str(), &actor.id)
            .await?
        else {
            return Ok(UndoOutcome::Ignored);
        };

        self.following_repo.delete_by_iri(&edge.iri).await?;

        if let Some(followee) = self.actor_repo.find_by_id(&edge.followee_id).await? {
            if followee.is_local() {
                self.actor_repo
                    .recalculate_followers_count(&followee.id)
                    .await?;
            } else {
                self.actor_repo
                    .adjust_followers_count(&followee.id, -1)
                    .await?;
            }
        }

        if actor.is_local() {
            self.actor_repo
                .recalculate_followees_count(&actor.id)
                .await?;
        } else {
            self.actor_repo.adjust_followees_count(&actor.id, -1).await?;
        }

        info!(
            follower = %actor.id,
            followee = %edge.followee_id,
            "Unfollowed"
        );

        Ok(UndoOutcome::Unfollowed)
    }

    /// The local post the undone reaction targeted, from recorded IRIs only.
    fn local_post_id(&self, inner: &EmbeddedActivity) -> Option<String> {
        let object_iri = inner.object_iri()?;
        self.urls.parse_object_iri(&object_iri)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::ApClient;
    use crate::instance::InstanceService;
    use chrono::Utc;
    use letterpress_db::entities::actor::ActorType;
    use letterpress_db::entities::following;
    use letterpress_db::repositories::{ActorKeypairRepository, InstanceRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn remote_actor(id: &str, username: &str) -> actor::Model {
        actor::Model {
            id: id.to_string(),
            iri: format!("https://remote.example/users/{username}"),
            actor_type: ActorType::Person,
            username: username.to_string(),
            instance_host: "remote.example".to_string(),
            handle_host: "remote.example".to_string(),
            blog_id: None,
            name: None,
            bio_html: None,
            avatar_url: None,
            header_url: None,
            url: None,
            field_htmls: json!({}),
            emojis: json!({}),
            tags: json!({}),
            aliases: json!([]),
            inbox_url: format!("https://remote.example/users/{username}/inbox"),
            shared_inbox_url: None,
            followers_url: None,
            featured_url: None,
            followees_count: 1,
            followers_count: 0,
            posts_count: 0,
            successor_id: None,
            published_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn local_actor(id: &str, username: &str) -> actor::Model {
        let mut actor = remote_actor(id, username);
        actor.iri = format!("https://blog.example/users/{username}");
        actor.instance_host = "blog.example".to_string();
        actor.handle_host = "blog.example".to_string();
        actor.blog_id = Some(format!("blog-{id}"));
        actor
    }

    fn processor(db: Arc<DatabaseConnection>) -> UndoProcessor {
        let urls = UrlConfig::new(Url::parse("https://blog.example").unwrap());
        let client = ApClient::new("https://blog.example").unwrap();
        let store = ActorStore::new(
            ActorRepository::new(Arc::clone(&db)),
            ActorKeypairRepository::new(Arc::clone(&db)),
            InstanceService::new(InstanceRepository::new(Arc::clone(&db)), client.clone()),
            client,
            urls.clone(),
        );
        UndoProcessor::new(
            ActorRepository::new(Arc::clone(&db)),
            FollowingRepository::new(Arc::clone(&db)),
            NotificationRepository::new(db),
            store,
            urls,
        )
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }

    fn undo_follow_activity() -> UndoActivity {
        serde_json::from_value(json!({
            "type": "Undo",
            "id": "https://remote.example/activities/u1",
            "actor": "https://remote.example/users/bob",
            "object": {
                "type": "Follow",
                "id": "https://remote.example/f/1",
                "actor": "https://remote.example/users/bob",
                "object": "https://blog.example/users/alice"
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_undo_follow_removes_edge_and_recounts() {
        let edge = following::Model {
            iri: "https://remote.example/f/1".to_string(),
            follower_id: "a2".to_string(),
            followee_id: "a1".to_string(),
            accepted: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // follower resolution
                .append_query_results([[remote_actor("a2", "bob")]])
                // edge lookup by (iri, follower)
                .append_query_results([[edge]])
                // edge delete
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                // followee lookup
                .append_query_results([[local_actor("a1", "alice")]])
                // followers recount returns the pre-follow value
                .append_query_results([[count_row(0)]])
                .append_exec_results([
                    // followers count update
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // remote follower delta
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let outcome = processor(db).process(&undo_follow_activity()).await.unwrap();
        assert!(matches!(outcome, UndoOutcome::Unfollowed));
    }

    #[tokio::test]
    async fn test_undo_follow_from_wrong_actor_is_ignored() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[remote_actor("a3", "mallory")]])
                // no edge under (iri, mallory): spoofed objectId
                .append_query_results([Vec::<following::Model>::new()])
                .into_connection(),
        );

        let mut activity = undo_follow_activity();
        activity.actor = Url::parse("https://remote.example/users/mallory").unwrap();

        let outcome = processor(db).process(&activity).await.unwrap();
        assert!(matches!(outcome, UndoOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_undo_like_removes_notifications() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[remote_actor("a2", "carol")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let activity: UndoActivity = serde_json::from_value(json!({
            "type": "Undo",
            "id": "https://remote.example/activities/u2",
            "actor": "https://remote.example/users/carol",
            "object": {
                "type": "Like",
                "id": "https://remote.example/l/9",
                "object": "https://blog.example/objects/01post"
            }
        }))
        .unwrap();

        let outcome = processor(db).process(&activity).await.unwrap();
        assert!(matches!(outcome, UndoOutcome::NotificationsRemoved(1)));
    }

    #[tokio::test]
    async fn test_undo_like_on_foreign_object_is_ignored() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[remote_actor("a2", "carol")]])
                .into_connection(),
        );

        let activity: UndoActivity = serde_json::from_value(json!({
            "type": "Undo",
            "id": "https://remote.example/activities/u3",
            "actor": "https://remote.example/users/carol",
            "object": {
                "type": "Like",
                "id": "https://remote.example/l/9",
                "object": "https://elsewhere.example/notes/4"
            }
        }))
        .unwrap();

        let outcome = processor(db).process(&activity).await.unwrap();
        assert!(matches!(outcome, UndoOutcome::Ignored));
    }
}
