//! `ActivityPub` actor document handler.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use letterpress_db::repositories::{ActorKeypairRepository, ActorRepository};
use tracing::{error, info};
use url::Url;

use crate::convert::{UrlConfig, actor_to_person};

/// State required for the actor document handler.
#[derive(Clone)]
pub struct ActorDocState {
    pub actor_repo: ActorRepository,
    pub keypair_repo: ActorKeypairRepository,
    pub urls: UrlConfig,
}

impl ActorDocState {
    /// Create a new actor document state.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        keypair_repo: ActorKeypairRepository,
        base_url: Url,
    ) -> Self {
        Self {
            actor_repo,
            keypair_repo,
            urls: UrlConfig::new(base_url),
        }
    }
}

/// Handle GET /users/{slug} — the blog's actor document.
pub async fn actor_handler(
    State(state): State<ActorDocState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    info!(slug = %slug, "Actor document lookup");

    let actor = match state.actor_repo.find_local_by_username(&slug).await {
        Ok(Some(actor)) => actor,
        Ok(None) => {
            info!(slug = %slug, "Actor not found");
            return (StatusCode::NOT_FOUND, "Actor not found").into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch actor");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let public_key_pem = match state.keypair_repo.find_by_actor_id(&actor.id).await {
        Ok(Some(keypair)) => Some(keypair.public_key),
        Ok(None) => {
            error!(actor_id = %actor.id, "Keypair not found for local actor");
            None
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch keypair");
            None
        }
    };

    let person = actor_to_person(&actor, &state.urls, public_key_pem.as_deref());

    (
        StatusCode::OK,
        [("Content-Type", "application/activity+json; charset=utf-8")],
        Json(person),
    )
        .into_response()
}
