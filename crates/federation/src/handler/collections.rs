//! `ActivityPub` collection handlers (outbox, followers, following).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use letterpress_db::entities::actor;
use letterpress_db::repositories::{ActorRepository, FollowingRepository, PostRepository};
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use crate::convert::{UrlConfig, post_to_article, wrap_post_activity};

/// Posts returned by the outbox.
const OUTBOX_LIMIT: u64 = 20;

/// State required for collection handlers.
#[derive(Clone)]
pub struct CollectionState {
    pub actor_repo: ActorRepository,
    pub post_repo: PostRepository,
    pub following_repo: FollowingRepository,
    pub urls: UrlConfig,
}

impl CollectionState {
    /// Create a new collection state.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        post_repo: PostRepository,
        following_repo: FollowingRepository,
        base_url: Url,
    ) -> Self {
        Self {
            actor_repo,
            post_repo,
            following_repo,
            urls: UrlConfig::new(base_url),
        }
    }

    async fn local_actor(&self, slug: &str) -> Result<actor::Model, axum::response::Response> {
        match self.actor_repo.find_local_by_username(slug).await {
            Ok(Some(actor)) => Ok(actor),
            Ok(None) => {
                info!(slug = %slug, "Actor not found");
                Err((StatusCode::NOT_FOUND, "Actor not found").into_response())
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch actor");
                Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())
            }
        }
    }
}

/// Flat `ActivityPub` `OrderedCollection` (no paging cursor).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: Url,
    pub total_items: u64,
    pub ordered_items: Vec<serde_json::Value>,
}

const ACTIVITYSTREAMS: &str = "https://www.w3.org/ns/activitystreams";

fn collection_response(collection: OrderedCollection) -> axum::response::Response {
    (
        StatusCode::OK,
        [("Content-Type", "application/activity+json; charset=utf-8")],
        Json(collection),
    )
        .into_response()
}

/// Handle GET /users/{slug}/outbox — recent posts as Create activities.
pub async fn outbox_handler(
    State(state): State<CollectionState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    info!(slug = %slug, "Outbox lookup");

    let actor = match state.local_actor(&slug).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let blog_id = actor.blog_id.clone().unwrap_or_default();
    let posts = match state
        .post_repo
        .find_published_by_blog(&blog_id, OUTBOX_LIMIT)
        .await
    {
        Ok(posts) => posts,
        Err(e) => {
            error!(error = %e, "Failed to fetch posts");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let items: Vec<serde_json::Value> = posts
        .iter()
        .map(|post| {
            let article = post_to_article(post, &actor, &state.urls);
            wrap_post_activity("Create", "create", article, &actor, &state.urls)
        })
        .collect();

    collection_response(OrderedCollection {
        context: ACTIVITYSTREAMS,
        kind: "OrderedCollection",
        id: state.urls.outbox_url(&slug),
        total_items: u64::try_from(actor.posts_count).unwrap_or(0),
        ordered_items: items,
    })
}

/// Handle GET /users/{slug}/followers — accepted followers as a flat list.
pub async fn followers_handler(
    State(state): State<CollectionState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    info!(slug = %slug, "Followers lookup");

    let actor = match state.local_actor(&slug).await {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let edges = match state.following_repo.find_accepted_followers(&actor.id).await {
        Ok(edges) => edges,
        Err(e) => {
            error!(error = %e, "Failed to fetch followers");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let follower_ids: Vec<String> = edges.iter().map(|edge| edge.follower_id.clone()).collect();
    let followers = match state.actor_repo.find_by_ids(&follower_ids).await {
        Ok(followers) => followers,
        Err(e) => {
            error!(error = %e, "Failed to fetch follower actors");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let items: Vec<serde_json::Value> = followers
        .iter()
        .map(|follower| serde_json::json!(follower.iri))
        .collect();

    collection_response(OrderedCollection {
        context: ACTIVITYSTREAMS,
        kind: "OrderedCollection",
        id: state.urls.followers_url(&slug),
        total_items: u64::try_from(actor.followers_count).unwrap_or(0),
        ordered_items: items,
    })
}

/// Handle GET /users/{slug}/following — always empty.
///
/// Blogs never follow outward in this design.
pub async fn following_handler(
    State(state): State<CollectionState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    info!(slug = %slug, "Following lookup");

    if let Err(response) = state.local_actor(&slug).await {
        return response;
    }

    collection_response(OrderedCollection {
        context: ACTIVITYSTREAMS,
        kind: "OrderedCollection",
        id: state.urls.following_url(&slug),
        total_items: 0,
        ordered_items: Vec::new(),
    })
}
