//! Outbound activity broadcast.
//!
//! Converts a local post into its federation object representation on
//! demand and pushes Create/Update/Delete activities to the accepted
//! followers' inboxes. Actor profile edits go out as `Update(Person)` over
//! the same delivery path.

use letterpress_common::{AppError, AppResult, IdGenerator};
use letterpress_db::{
    entities::actor,
    repositories::{
        ActorKeypairRepository, ActorRepository, BlogRepository, FollowingRepository,
        PostRepository,
    },
};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::client::ApClient;
use crate::convert::{UrlConfig, actor_to_person, post_to_article, post_to_tombstone, wrap_post_activity};

/// Post lifecycle event to broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Create,
    Update,
    Delete,
}

impl PostAction {
    const fn activity_kind(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }

    const fn fragment(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Broadcasts post and profile lifecycle events to followers.
#[derive(Clone)]
pub struct Broadcaster {
    blog_repo: BlogRepository,
    post_repo: PostRepository,
    actor_repo: ActorRepository,
    following_repo: FollowingRepository,
    keypair_repo: ActorKeypairRepository,
    client: ApClient,
    urls: UrlConfig,
    id_gen: IdGenerator,
}

impl Broadcaster {
    /// Create a new broadcaster.
    #[must_use]
    pub fn new(
        blog_repo: BlogRepository,
        post_repo: PostRepository,
        actor_repo: ActorRepository,
        following_repo: FollowingRepository,
        keypair_repo: ActorKeypairRepository,
        client: ApClient,
        urls: UrlConfig,
    ) -> Self {
        Self {
            blog_repo,
            post_repo,
            actor_repo,
            following_repo,
            keypair_repo,
            client,
            urls,
            id_gen: IdGenerator::new(),
        }
    }

    /// Broadcast a post lifecycle event to all accepted followers.
    ///
    /// Invoked by the post-publish flow. An actor without stored keys
    /// cannot sign and the broadcast is skipped rather than failed.
    pub async fn send_post_to_followers(
        &self,
        blog_slug: &str,
        post_id: &str,
        action: PostAction,
    ) -> AppResult<()> {
        let blog = self
            .blog_repo
            .find_by_slug(blog_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blog not found: {blog_slug}")))?;

        let actor = self
            .actor_repo
            .find_by_blog_id(&blog.id)
            .await?
            .ok_or_else(|| AppError::ActorNotFound(blog_slug.to_string()))?;

        let Some(keypair) = self.keypair_repo.find_by_actor_id(&actor.id).await? else {
            warn!(slug = %blog_slug, "Actor has no signing keys, skipping broadcast");
            return Ok(());
        };

        let object = if action == PostAction::Delete {
            post_to_tombstone(post_id, &self.urls)
        } else {
            let post = self
                .post_repo
                .find_by_id(post_id)
                .await?
                .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
            post_to_article(&post, &actor, &self.urls)
        };

        let activity = wrap_post_activity(
            action.activity_kind(),
            action.fragment(),
            object,
            &actor,
            &self.urls,
        );

        self.deliver_to_followers(&actor, &activity, &keypair.private_key, &keypair.key_id)
            .await
    }

    /// Broadcast an `Update(Person)` after an actor profile edit.
    ///
    /// Invoked by the blog-settings-save flow.
    pub async fn broadcast_actor_update(&self, blog_slug: &str) -> AppResult<()> {
        let blog = self
            .blog_repo
            .find_by_slug(blog_slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blog not found: {blog_slug}")))?;

        let actor = self
            .actor_repo
            .find_by_blog_id(&blog.id)
            .await?
            .ok_or_else(|| AppError::ActorNotFound(blog_slug.to_string()))?;

        let Some(keypair) = self.keypair_repo.find_by_actor_id(&actor.id).await? else {
            warn!(slug = %blog_slug, "Actor has no signing keys, skipping broadcast");
            return Ok(());
        };

        let person = actor_to_person(&actor, &self.urls, Some(&keypair.public_key));
        let activity = serde_json::json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "id": format!("{}#updates/{}", actor.iri, self.id_gen.generate()),
            "type": "Update",
            "actor": actor.iri,
            "to": ["https://www.w3.org/ns/activitystreams#Public"],
            "object": person,
        });

        self.deliver_to_followers(&actor, &activity, &keypair.private_key, &keypair.key_id)
            .await
    }

    async fn deliver_to_followers(
        &self,
        actor: &actor::Model,
        activity: &Value,
        private_key_pem: &str,
        key_id: &str,
    ) -> AppResult<()> {
        let inboxes = self.collect_inboxes(&actor.id).await?;

        info!(
            actor = %actor.username,
            activity_type = activity.get("type").and_then(serde_json::Value::as_str).unwrap_or("Unknown"),
            inbox_count = inboxes.len(),
            "Broadcasting to followers"
        );

        for inbox in inboxes {
            if let Err(e) = self
                .client
                .deliver(&inbox, activity, private_key_pem, key_id)
                .await
            {
                // Per-inbox failures must not abort the fan-out.
                warn!(inbox = %inbox, error = %e, "Delivery failed");
            }
        }

        Ok(())
    }

    /// Collect delivery inboxes for an actor's accepted followers.
    ///
    /// Shared inboxes are preferred so one delivery covers every follower
    /// on that instance; the local origin is never a delivery target.
    async fn collect_inboxes(&self, actor_id: &str) -> AppResult<Vec<Url>> {
        let followers = self.following_repo.find_accepted_followers(actor_id).await?;

        let follower_ids: Vec<String> = followers
            .iter()
            .map(|edge| edge.follower_id.clone())
            .collect();
        let follower_actors = self.actor_repo.find_by_ids(&follower_ids).await?;

        let mut inboxes: Vec<Url> = Vec::new();
        for follower in &follower_actors {
            let inbox = follower
                .shared_inbox_url
                .as_deref()
                .unwrap_or(&follower.inbox_url);

            let Ok(inbox) = Url::parse(inbox) else {
                warn!(actor = %follower.id, inbox = %inbox, "Skipping unparseable inbox");
                continue;
            };

            if self.urls.is_local(&inbox) {
                continue;
            }

            if !inboxes.contains(&inbox) {
                inboxes.push(inbox);
            }
        }

        Ok(inboxes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use letterpress_db::entities::actor::ActorType;
    use letterpress_db::entities::following;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn broadcaster(db: Arc<DatabaseConnection>) -> Broadcaster {
        let urls = UrlConfig::new(Url::parse("https://blog.example").unwrap());
        let client = ApClient::new("https://blog.example").unwrap();
        Broadcaster::new(
            BlogRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            ActorRepository::new(Arc::clone(&db)),
            FollowingRepository::new(Arc::clone(&db)),
            ActorKeypairRepository::new(Arc::clone(&db)),
            client,
            urls,
        )
    }

    fn follower(id: &str, host: &str, shared: Option<&str>) -> actor::Model {
        actor::Model {
            id: id.to_string(),
            iri: format!("https://{host}/users/{id}"),
            actor_type: ActorType::Person,
            username: id.to_string(),
            instance_host: host.to_string(),
            handle_host: host.to_string(),
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
            inbox_url: format!("https://{host}/users/{id}/inbox"),
            shared_inbox_url: shared.map(String::from),
            followers_url: None,
            featured_url: None,
            followees_count: 0,
            followers_count: 0,
            posts_count: 0,
            successor_id: None,
            published_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn edge(iri: &str, follower_id: &str) -> following::Model {
        following::Model {
            iri: iri.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: "a1".to_string(),
            accepted: Some(Utc::now().into()),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_collect_inboxes_prefers_shared_and_dedupes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    edge("https://remote.example/f/1", "f1"),
                    edge("https://remote.example/f/2", "f2"),
                    edge("https://other.example/f/3", "f3"),
                ]])
                .append_query_results([vec![
                    follower("f1", "remote.example", Some("https://remote.example/inbox")),
                    follower("f2", "remote.example", Some("https://remote.example/inbox")),
                    follower("f3", "other.example", None),
                ]])
                .into_connection(),
        );

        let inboxes = broadcaster(db).collect_inboxes("a1").await.unwrap();

        // Two followers on remote.example collapse into one shared inbox.
        assert_eq!(inboxes.len(), 2);
        assert_eq!(inboxes[0].as_str(), "https://remote.example/inbox");
        assert_eq!(inboxes[1].as_str(), "https://other.example/users/f3/inbox");
    }

    #[tokio::test]
    async fn test_collect_inboxes_excludes_local_origin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![edge("https://blog.example/f/self", "f4")]])
                .append_query_results([vec![follower(
                    "f4",
                    "blog.example",
                    Some("https://blog.example/inbox"),
                )]])
                .into_connection(),
        );

        let inboxes = broadcaster(db).collect_inboxes("a1").await.unwrap();
        assert!(inboxes.is_empty());
    }
}
