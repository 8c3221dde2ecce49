//! `WebFinger` handler for actor discovery.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use letterpress_db::repositories::ActorRepository;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::convert::UrlConfig;

/// `WebFinger` query parameters.
#[derive(Debug, Deserialize)]
pub struct WebfingerQuery {
    pub resource: String,
}

/// `WebFinger` response.
#[derive(Debug, Serialize)]
pub struct WebfingerResponse {
    pub subject: String,
    pub aliases: Vec<String>,
    pub links: Vec<WebfingerLink>,
}

/// `WebFinger` link.
#[derive(Debug, Serialize)]
pub struct WebfingerLink {
    pub rel: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// State required for the `WebFinger` handler.
#[derive(Clone)]
pub struct WebfingerState {
    pub domain: String,
    pub actor_repo: ActorRepository,
    pub urls: UrlConfig,
}

impl WebfingerState {
    /// Create a new `WebFinger` state.
    #[must_use]
    pub const fn new(domain: String, actor_repo: ActorRepository, base_url: Url) -> Self {
        Self {
            domain,
            actor_repo,
            urls: UrlConfig::new(base_url),
        }
    }
}

/// Parse an `acct:user@host` resource.
fn parse_resource(resource: &str) -> Option<(String, String)> {
    let rest = resource.strip_prefix("acct:")?;
    let (username, domain) = rest.split_once('@')?;
    if username.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some((username.to_string(), domain.to_string()))
}

/// Handle GET /.well-known/webfinger.
///
/// Resolves a handle to the actor document and profile page links.
/// Example: `/.well-known/webfinger?resource=acct:alice@blog.example`
pub async fn webfinger_handler(
    State(state): State<WebfingerState>,
    Query(query): Query<WebfingerQuery>,
) -> impl IntoResponse {
    info!(resource = %query.resource, "WebFinger lookup");

    let Some((username, domain)) = parse_resource(&query.resource) else {
        return (StatusCode::BAD_REQUEST, "Invalid resource format").into_response();
    };

    if domain != state.domain {
        return (StatusCode::NOT_FOUND, "Unknown domain").into_response();
    }

    let actor = match state.actor_repo.find_local_by_username(&username).await {
        Ok(Some(actor)) => actor,
        Ok(None) => {
            info!(username = %username, "Actor not found for WebFinger");
            return (StatusCode::NOT_FOUND, "Actor not found").into_response();
        }
        Err(e) => {
            warn!(error = %e, "Database error during WebFinger lookup");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let actor_url = state.urls.user_url(&actor.username);
    let profile_url = state.urls.blog_page_url(&actor.username);

    let response = WebfingerResponse {
        subject: query.resource,
        aliases: vec![actor_url.to_string(), profile_url.to_string()],
        links: vec![
            WebfingerLink {
                rel: "self".to_string(),
                link_type: Some("application/activity+json".to_string()),
                href: Some(actor_url.to_string()),
            },
            WebfingerLink {
                rel: "http://webfinger.net/rel/profile-page".to_string(),
                link_type: Some("text/html".to_string()),
                href: Some(profile_url.to_string()),
            },
        ],
    };

    (
        StatusCode::OK,
        [("Content-Type", "application/jrd+json")],
        Json(response),
    )
        .into_response()
}
