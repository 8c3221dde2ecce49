//! Follow activity processor.

use chrono::Utc;
use letterpress_common::{AppError, AppResult, IdGenerator};
use letterpress_db::{
    entities::{actor, following},
    repositories::{ActorRepository, FollowingRepository},
};
use sea_orm::Set;
use tracing::info;
use url::Url;

use crate::activities::{AcceptActivity, FollowActivity};
use crate::convert::UrlConfig;
use crate::store::ActorStore;

/// Processor for inbound Follow activities.
///
/// Follows are auto-approved: the edge is inserted with `accepted` set
/// immediately and there is no manual review state.
#[derive(Clone)]
pub struct FollowProcessor {
    actor_repo: ActorRepository,
    following_repo: FollowingRepository,
    store: ActorStore,
    urls: UrlConfig,
    id_gen: IdGenerator,
}

/// Result of processing a Follow activity.
#[derive(Debug)]
pub enum FollowOutcome {
    /// A new edge was inserted; the caller must deliver the Accept.
    Accepted {
        accept: AcceptActivity,
        inbox: Url,
        followee: actor::Model,
    },
    /// Duplicate delivery absorbed by the conflict-free insert. No second
    /// Accept may be sent.
    AlreadyFollowing,
    /// The follower could not be resolved; the activity is dropped.
    Skipped { reason: String },
}

impl FollowProcessor {
    /// Create a new follow processor.
    #[must_use]
    pub fn new(
        actor_repo: ActorRepository,
        following_repo: FollowingRepository,
        store: ActorStore,
        urls: UrlConfig,
    ) -> Self {
        Self {
            actor_repo,
            following_repo,
            store,
            urls,
            id_gen: IdGenerator::new(),
        }
    }

    /// Process an incoming Follow activity from a remote actor.
    pub async fn process(&self, activity: &FollowActivity) -> AppResult<FollowOutcome> {
        info!(
            actor = %activity.actor,
            object = %activity.object,
            "Processing Follow activity"
        );

        // The target must parse as a local actor IRI; anything else is a
        // malformed request, not a droppable activity.
        let slug = self.urls.parse_user_iri(&activity.object).ok_or_else(|| {
            AppError::BadRequest(format!("Cannot parse followee IRI: {}", activity.object))
        })?;

        let followee = self
            .actor_repo
            .find_local_by_username(&slug)
            .await?
            .ok_or_else(|| AppError::ActorNotFound(slug.clone()))?;

        let Some(follower) = self.store.resolve_actor(&activity.actor).await? else {
            return Ok(FollowOutcome::Skipped {
                reason: format!("Cannot resolve follower {}", activity.actor),
            });
        };

        let now = Utc::now().fixed_offset();
        let model = following::ActiveModel {
            iri: Set(activity.id.to_string()),
            follower_id: Set(follower.id.clone()),
            followee_id: Set(followee.id.clone()),
            accepted: Set(Some(now)),
            created_at: Set(now),
        };

        let inserted = self.following_repo.insert_if_absent(model).await?;
        if !inserted {
            info!(
                follower = %follower.id,
                followee = %followee.id,
                "Duplicate Follow absorbed"
            );
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        self.update_counters(&follower, &followee).await?;

        let accept = self.build_accept(&followee, activity)?;
        let inbox = delivery_inbox(&follower)?;

        info!(
            follower = %follower.handle(),
            followee = %followee.handle(),
            "Follow accepted"
        );

        Ok(FollowOutcome::Accepted {
            accept,
            inbox,
            followee,
        })
    }

    /// Counters touch only freshly inserted edges: the local followee is
    /// recomputed from rows, the remote follower gets a cheap delta on its
    /// cached snapshot.
    async fn update_counters(
        &self,
        follower: &actor::Model,
        followee: &actor::Model,
    ) -> AppResult<()> {
        self.actor_repo
            .recalculate_followers_count(&followee.id)
            .await?;

        if follower.is_local() {
            self.actor_repo
                .recalculate_followees_count(&follower.id)
                .await?;
        } else {
            self.actor_repo
                .adjust_followees_count(&follower.id, 1)
                .await?;
        }

        Ok(())
    }

    fn build_accept(
        &self,
        followee: &actor::Model,
        activity: &FollowActivity,
    ) -> AppResult<AcceptActivity> {
        let followee_iri = Url::parse(&followee.iri)
            .map_err(|e| AppError::Internal(format!("Stored actor IRI invalid: {e}")))?;

        let accept_id = Url::parse(&format!(
            "{}#accepts/follows/{}",
            followee.iri,
            self.id_gen.generate()
        ))
        .map_err(|e| AppError::Internal(format!("Cannot build Accept id: {e}")))?;

        Ok(AcceptActivity::new(
            accept_id,
            followee_iri,
            activity.clone(),
        ))
    }
}

/// The inbox an Accept should go to, preferring the shared inbox.
fn delivery_inbox(follower: &actor::Model) -> AppResult<Url> {
    let inbox = follower
        .shared_inbox_url
        .as_deref()
        .unwrap_or(&follower.inbox_url);

    Url::parse(inbox).map_err(|e| AppError::Internal(format!("Stored inbox URL invalid: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::ApClient;
    use crate::instance::InstanceService;
    use letterpress_db::entities::actor::ActorType;
    use letterpress_db::repositories::{ActorKeypairRepository, InstanceRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn local_actor(id: &str, username: &str) -> actor::Model {
        actor::Model {
            id: id.to_string(),
            iri: format!("https://blog.example/users/{username}"),
            actor_type: ActorType::Person,
            username: username.to_string(),
            instance_host: "blog.example".to_string(),
            handle_host: "blog.example".to_string(),
            blog_id: Some(format!("blog-{id}")),
            name: None,
            bio_html: None,
            avatar_url: None,
            header_url: None,
            url: None,
            field_htmls: json!({}),
            emojis: json!({}),
            tags: json!({}),
            aliases: json!([]),
            inbox_url: format!("https://blog.example/users/{username}/inbox"),
            shared_inbox_url: Some("https://blog.example/inbox".to_string()),
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

    fn remote_actor(id: &str, username: &str) -> actor::Model {
        let mut actor = local_actor(id, username);
        actor.iri = format!("https://remote.example/users/{username}");
        actor.instance_host = "remote.example".to_string();
        actor.handle_host = "remote.example".to_string();
        actor.blog_id = None;
        actor.inbox_url = format!("https://remote.example/users/{username}/inbox");
        actor.shared_inbox_url = Some("https://remote.example/inbox".to_string());
        actor
    }

    fn processor(db: Arc<DatabaseConnection>) -> FollowProcessor {
        let urls = UrlConfig::new(Url::parse("https://blog.example").unwrap());
        let client = ApClient::new("https://blog.example").unwrap();
        let store = ActorStore::new(
            ActorRepository::new(Arc::clone(&db)),
            ActorKeypairRepository::new(Arc::clone(&db)),
            InstanceService::new(InstanceRepository::new(Arc::clone(&db)), client.clone()),
            client,
            urls.clone(),
        );
        FollowProcessor::new(
            ActorRepository::new(Arc::clone(&db)),
            FollowingRepository::new(db),
            store,
            urls,
        )
    }

    fn follow_activity() -> FollowActivity {
        FollowActivity::new(
            Url::parse("https://remote.example/f/1").unwrap(),
            Url::parse("https://remote.example/users/bob").unwrap(),
            Url::parse("https://blog.example/users/alice").unwrap(),
        )
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }

    #[tokio::test]
    async fn test_fresh_follow_accepts_and_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // followee lookup, then follower lookup in the store
                .append_query_results([[local_actor("a1", "alice")]])
                .append_query_results([[remote_actor("a2", "bob")]])
                // insert succeeds
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                // followers recount for the local followee
                .append_query_results([[count_row(1)]])
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

        let outcome = processor(db).process(&follow_activity()).await.unwrap();

        match outcome {
            FollowOutcome::Accepted { accept, inbox, followee } => {
                assert_eq!(accept.object.id.as_str(), "https://remote.example/f/1");
                assert_eq!(accept.actor.as_str(), "https://blog.example/users/alice");
                assert!(accept.id.as_str().starts_with(
                    "https://blog.example/users/alice#accepts/follows/"
                ));
                // Shared inbox preferred over the per-actor inbox.
                assert_eq!(inbox.as_str(), "https://remote.example/inbox");
                assert_eq!(followee.id, "a1");
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_follow_sends_no_second_accept() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[local_actor("a1", "alice")]])
                .append_query_results([[remote_actor("a2", "bob")]])
                // conflict: no row inserted, and no counter statements follow
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let outcome = processor(db).process(&follow_activity()).await.unwrap();

        assert!(matches!(outcome, FollowOutcome::AlreadyFollowing));
    }

    #[tokio::test]
    async fn test_unknown_followee_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<actor::Model>::new()])
                .into_connection(),
        );

        let err = processor(db).process(&follow_activity()).await.unwrap_err();
        assert!(matches!(err, AppError::ActorNotFound(_)));
    }

    #[tokio::test]
    async fn test_foreign_object_iri_is_bad_request() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let activity = FollowActivity::new(
            Url::parse("https://remote.example/f/1").unwrap(),
            Url::parse("https://remote.example/users/bob").unwrap(),
            Url::parse("https://elsewhere.example/users/alice").unwrap(),
        );

        let err = processor(db).process(&activity).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
