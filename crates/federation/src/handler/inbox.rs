//! Inbox handlers for receiving `ActivityPub` activities.

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode},
};
use letterpress_common::{AppError, AppResult};
use letterpress_db::repositories::{
    ActorKeypairRepository, ActorRepository, FollowingRepository, NotificationRepository,
    PostRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::activities::{
    AnnounceActivity, CreateActivity, DeleteActivity, EmojiReactActivity, FollowActivity,
    LikeActivity, UndoActivity, UpdateActivity,
};
use crate::client::ApClient;
use crate::convert::UrlConfig;
use crate::processor::{
    AnnounceProcessor, CreateProcessor, DeleteProcessor, EmojiReactProcessor, FollowOutcome,
    FollowProcessor, LikeProcessor, UndoProcessor, UpdateProcessor,
};
use crate::store::ActorStore;
use crate::verify::RequestVerifier;

/// Closed union of the activity kinds this service ingests.
///
/// Dispatch is an exhaustive match over these variants; anything else
/// deserializes as `Unknown` and is logged and dropped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum InboxActivity {
    Follow(FollowActivity),
    Undo(UndoActivity),
    Create(CreateActivity),
    Update(UpdateActivity),
    Delete(DeleteActivity),
    Announce(AnnounceActivity),
    Like(LikeActivity),
    EmojiReact(EmojiReactActivity),
    Unknown(Value),
}

impl InboxActivity {
    /// The activity type as a string.
    #[must_use]
    pub const fn activity_type(&self) -> &str {
        match self {
            Self::Follow(_) => "Follow",
            Self::Undo(_) => "Undo",
            Self::Create(_) => "Create",
            Self::Update(_) => "Update",
            Self::Delete(_) => "Delete",
            Self::Announce(_) => "Announce",
            Self::Like(_) => "Like",
            Self::EmojiReact(_) => "EmojiReact",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// The acting actor's IRI.
    #[must_use]
    pub const fn actor(&self) -> Option<&Url> {
        match self {
            Self::Follow(a) => Some(&a.actor),
            Self::Undo(a) => Some(&a.actor),
            Self::Create(a) => Some(&a.actor),
            Self::Update(a) => Some(&a.actor),
            Self::Delete(a) => Some(&a.actor),
            Self::Announce(a) => Some(&a.actor),
            Self::Like(a) => Some(&a.actor),
            Self::EmojiReact(a) => Some(&a.actor),
            Self::Unknown(_) => None,
        }
    }
}

/// State required for the inbox handlers.
#[derive(Clone)]
pub struct InboxState {
    pub actor_repo: ActorRepository,
    pub keypair_repo: ActorKeypairRepository,
    pub following_repo: FollowingRepository,
    pub notification_repo: NotificationRepository,
    pub post_repo: PostRepository,
    pub store: ActorStore,
    pub verifier: RequestVerifier,
    pub client: ApClient,
    pub urls: UrlConfig,
}

impl InboxState {
    /// Create a new inbox state.
    #[must_use]
    pub fn new(
        actor_repo: ActorRepository,
        keypair_repo: ActorKeypairRepository,
        following_repo: FollowingRepository,
        notification_repo: NotificationRepository,
        post_repo: PostRepository,
        store: ActorStore,
        client: ApClient,
        base_url: Url,
    ) -> Self {
        let urls = UrlConfig::new(base_url);
        let verifier = RequestVerifier::new(
            actor_repo.clone(),
            keypair_repo.clone(),
            client.clone(),
            urls.clone(),
        );
        Self {
            actor_repo,
            keypair_repo,
            following_repo,
            notification_repo,
            post_repo,
            store,
            verifier,
            client,
            urls,
        }
    }
}

/// Handle POST /inbox (shared inbox).
pub async fn inbox_handler(
    State(state): State<InboxState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    handle_inbox(&state, uri.path(), &headers, &body).await
}

/// Handle POST /users/{slug}/inbox (per-actor inbox).
pub async fn user_inbox_handler(
    State(state): State<InboxState>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    // Unknown per-actor target is a 404, before any other work.
    if state
        .actor_repo
        .find_local_by_username(&slug)
        .await?
        .is_none()
    {
        return Err(AppError::ActorNotFound(slug));
    }

    handle_inbox(&state, uri.path(), &headers, &body).await
}

async fn handle_inbox(
    state: &InboxState,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<StatusCode, AppError> {
    let activity: InboxActivity = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Malformed activity: {e}")))?;

    info!(
        activity_type = activity.activity_type(),
        actor = ?activity.actor().map(Url::as_str),
        "Received activity"
    );

    // Signature verification is the one fetch that hard-fails the request.
    // It runs before any processing so a rejected request has no side
    // effects.
    let signer = state.verifier.verify("POST", path, headers, body).await?;

    // The signer vouches for the activity; an actor from another host is
    // not something this signature authenticates.
    if let Some(actor) = activity.actor() {
        if actor.host_str() != signer.host_str() {
            warn!(
                signer = %signer,
                actor = %actor,
                "Signer host does not match activity actor, dropping"
            );
            return Ok(StatusCode::ACCEPTED);
        }
    }

    process_activity(state, &activity).await?;

    Ok(StatusCode::ACCEPTED)
}

/// Dispatch a verified activity to its processor.
async fn process_activity(state: &InboxState, activity: &InboxActivity) -> AppResult<()> {
    match activity {
        InboxActivity::Follow(follow) => {
            let processor = FollowProcessor::new(
                state.actor_repo.clone(),
                state.following_repo.clone(),
                state.store.clone(),
                state.urls.clone(),
            );

            if let FollowOutcome::Accepted {
                accept,
                inbox,
                followee,
            } = processor.process(follow).await?
            {
                send_accept(state, &followee.id, &accept, &inbox).await;
            }
        }
        InboxActivity::Undo(undo) => {
            let processor = UndoProcessor::new(
                state.actor_repo.clone(),
                state.following_repo.clone(),
                state.notification_repo.clone(),
                state.store.clone(),
                state.urls.clone(),
            );
            processor.process(undo).await?;
        }
        InboxActivity::Create(create) => {
            let processor = CreateProcessor::new(
                state.actor_repo.clone(),
                state.post_repo.clone(),
                state.notification_repo.clone(),
                state.store.clone(),
                state.urls.clone(),
            );
            processor.process(create).await?;
        }
        InboxActivity::Update(update) => {
            let processor = UpdateProcessor::new(state.store.clone());
            processor.process(update).await?;
        }
        InboxActivity::Delete(delete) => {
            let processor = DeleteProcessor::new(state.notification_repo.clone());
            processor.process(delete).await?;
        }
        InboxActivity::Announce(announce) => {
            let processor = AnnounceProcessor::new(
                state.post_repo.clone(),
                state.notification_repo.clone(),
                state.store.clone(),
                state.urls.clone(),
            );
            processor.process(announce).await?;
        }
        InboxActivity::Like(like) => {
            let processor = LikeProcessor::new(
                state.post_repo.clone(),
                state.notification_repo.clone(),
                state.store.clone(),
                state.urls.clone(),
            );
            processor.process(like).await?;
        }
        InboxActivity::EmojiReact(react) => {
            let processor = EmojiReactProcessor::new(
                state.post_repo.clone(),
                state.notification_repo.clone(),
                state.store.clone(),
                state.urls.clone(),
            );
            processor.process(react).await?;
        }
        InboxActivity::Unknown(value) => {
            warn!(activity_type = ?value.get("type"), "Unknown activity type, dropping");
        }
    }

    Ok(())
}

/// Sign and deliver the Accept for a fresh follow, synchronously.
///
/// Delivery failure is logged, not surfaced: the edge is already
/// committed and most servers retry their Follow anyway.
async fn send_accept(
    state: &InboxState,
    followee_id: &str,
    accept: &crate::activities::AcceptActivity,
    inbox: &Url,
) {
    let keypair = match state.keypair_repo.find_by_actor_id(followee_id).await {
        Ok(Some(keypair)) => keypair,
        Ok(None) => {
            warn!(actor = %followee_id, "No signing keys, cannot send Accept");
            return;
        }
        Err(e) => {
            warn!(actor = %followee_id, error = %e, "Keypair lookup failed");
            return;
        }
    };

    let value = match serde_json::to_value(accept) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Cannot serialize Accept");
            return;
        }
    };

    if let Err(e) = state
        .client
        .deliver(inbox, &value, &keypair.private_key, &keypair.key_id)
        .await
    {
        warn!(inbox = %inbox, error = %e, "Accept delivery failed");
    }
}
