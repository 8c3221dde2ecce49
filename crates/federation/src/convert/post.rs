//! Post row -> `ActivityPub` Article object and wrapping activities.
//!
//! The federation object is derived from the Post row on every build;
//! nothing here is persisted.

use letterpress_db::entities::{actor, post};
use serde_json::{Value, json};

use super::UrlConfig;

/// Public addressing collection.
pub const PUBLIC_AUDIENCE: &str = "https://www.w3.org/ns/activitystreams#Public";

/// Build the Article object for a published post.
///
/// The object content is the title and body concatenated; `published` comes
/// from the first publish time, and `updated` appears only when a strictly
/// later publish time is recorded, so a re-save that keeps the publish time
/// does not produce Update noise.
#[must_use]
pub fn post_to_article(post: &post::Model, author: &actor::Model, config: &UrlConfig) -> Value {
    let object_url = config.object_url(&post.id);
    let followers = config.followers_url(&author.username);

    let content = format!("<h1>{}</h1>\n{}", post.title, post.content_html);

    let mut object = json!({
        "id": object_url.to_string(),
        "type": "Article",
        "attributedTo": author.iri,
        "name": post.title,
        "content": content,
        "url": config.post_page_url(&author.username, &post.id).to_string(),
        "to": [PUBLIC_AUDIENCE],
        "cc": [followers.to_string()],
    });

    if let Some(first) = &post.first_published_at {
        object["published"] = json!(first.to_rfc3339());

        if let Some(published) = &post.published_at {
            if published > first {
                object["updated"] = json!(published.to_rfc3339());
            }
        }
    }

    object
}

/// Build the Tombstone object for a deleted post.
#[must_use]
pub fn post_to_tombstone(post_id: &str, config: &UrlConfig) -> Value {
    json!({
        "id": config.object_url(post_id).to_string(),
        "type": "Tombstone",
    })
}

/// Wrap an object in a Create/Update/Delete activity.
///
/// The activity id is the object IRI plus a stable fragment, so re-delivery
/// of the same lifecycle event carries the same id.
#[must_use]
pub fn wrap_post_activity(
    kind: &str,
    fragment: &str,
    object: Value,
    author: &actor::Model,
    config: &UrlConfig,
) -> Value {
    let object_id = object
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let followers = config.followers_url(&author.username);

    json!({
        "@context": "https://www.w3.org/ns/activitystreams",
        "id": format!("{object_id}#{fragment}"),
        "type": kind,
        "actor": author.iri,
        "to": [PUBLIC_AUDIENCE],
        "cc": [followers.to_string()],
        "object": object,
    })
}
