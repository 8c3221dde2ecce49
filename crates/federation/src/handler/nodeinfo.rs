//! `NodeInfo` handlers for instance discovery.
//!
//! Remote instance registries probe these documents the same way ours
//! probes theirs.

#![allow(clippy::expect_used)] // URL joins with known-valid paths cannot fail

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use letterpress_db::repositories::{ActorRepository, PostRepository};
use serde::Serialize;
use url::Url;

/// `NodeInfo` well-known response.
#[derive(Debug, Serialize)]
pub struct NodeInfoWellKnown {
    pub links: Vec<NodeInfoLink>,
}

/// `NodeInfo` link.
#[derive(Debug, Serialize)]
pub struct NodeInfoLink {
    pub rel: String,
    pub href: String,
}

/// `NodeInfo` 2.1 response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub version: String,
    pub software: NodeInfoSoftwareDoc,
    pub protocols: Vec<String>,
    pub usage: NodeInfoUsage,
    pub open_registrations: bool,
    pub metadata: NodeInfoMetadata,
}

/// `NodeInfo` software information.
#[derive(Debug, Serialize)]
pub struct NodeInfoSoftwareDoc {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// `NodeInfo` usage statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoUsage {
    pub users: NodeInfoUsers,
    pub local_posts: u64,
}

/// `NodeInfo` user statistics.
#[derive(Debug, Serialize)]
pub struct NodeInfoUsers {
    pub total: u64,
}

/// `NodeInfo` metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoMetadata {
    pub node_name: String,
    pub node_description: String,
}

/// State for `NodeInfo` handlers.
#[derive(Clone)]
pub struct NodeInfoState {
    pub base_url: Url,
    pub instance_name: String,
    pub instance_description: String,
    pub version: String,
    pub actor_repo: ActorRepository,
    pub post_repo: PostRepository,
}

impl NodeInfoState {
    /// Create new `NodeInfo` state.
    #[must_use]
    pub const fn new(
        base_url: Url,
        instance_name: String,
        instance_description: String,
        version: String,
        actor_repo: ActorRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            base_url,
            instance_name,
            instance_description,
            version,
            actor_repo,
            post_repo,
        }
    }
}

/// Handle /.well-known/nodeinfo.
pub async fn well_known_nodeinfo(State(state): State<NodeInfoState>) -> impl IntoResponse {
    let nodeinfo_url = state.base_url.join("/nodeinfo/2.1").expect("valid URL");

    let response = NodeInfoWellKnown {
        links: vec![NodeInfoLink {
            rel: "http://nodeinfo.diaspora.software/ns/schema/2.1".to_string(),
            href: nodeinfo_url.to_string(),
        }],
    };

    (
        StatusCode::OK,
        [("Content-Type", "application/json")],
        Json(response),
    )
}

/// Handle /nodeinfo/2.1.
pub async fn nodeinfo_2_1(State(state): State<NodeInfoState>) -> impl IntoResponse {
    let total_blogs = state.actor_repo.count_local().await.unwrap_or(0);
    let local_posts = state.post_repo.count_published().await.unwrap_or(0);

    let response = NodeInfo {
        version: "2.1".to_string(),
        software: NodeInfoSoftwareDoc {
            name: "letterpress".to_string(),
            version: state.version.clone(),
            homepage: Some(state.base_url.to_string()),
        },
        protocols: vec!["activitypub".to_string()],
        usage: NodeInfoUsage {
            users: NodeInfoUsers { total: total_blogs },
            local_posts,
        },
        open_registrations: false,
        metadata: NodeInfoMetadata {
            node_name: state.instance_name.clone(),
            node_description: state.instance_description.clone(),
        },
    };

    (
        StatusCode::OK,
        [(
            "Content-Type",
            "application/json; profile=\"http://nodeinfo.diaspora.software/ns/schema/2.1#\"",
        )],
        Json(response),
    )
}
