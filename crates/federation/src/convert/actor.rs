//! Actor row -> `ActivityPub` Person document.

use letterpress_db::entities::actor;
use serde_json::{Value, json};

use super::UrlConfig;

/// `ActivityStreams` context for actor documents.
fn actor_context() -> Value {
    json!([
        "https://www.w3.org/ns/activitystreams",
        "https://w3id.org/security/v1",
        {
            "toot": "http://joinmastodon.org/ns#",
            "Emoji": "toot:Emoji",
            "featured": "toot:featured",
            "discoverable": "toot:discoverable",
            "schema": "http://schema.org#",
            "PropertyValue": "schema:PropertyValue",
            "value": "schema:value"
        }
    ])
}

/// Build the actor document served at `GET /users/{slug}` and broadcast in
/// `Update(Person)` activities.
#[must_use]
pub fn actor_to_person(
    actor: &actor::Model,
    config: &UrlConfig,
    public_key_pem: Option<&str>,
) -> Value {
    let username = &actor.username;
    let actor_url = config.user_url(username);

    let mut person = json!({
        "@context": actor_context(),
        "id": actor_url.to_string(),
        "type": "Person",
        "preferredUsername": username,
        "name": actor.name,
        "summary": actor.bio_html,
        "url": actor.url.clone().unwrap_or_else(|| config.blog_page_url(username).to_string()),
        "inbox": config.inbox_url(username).to_string(),
        "outbox": config.outbox_url(username).to_string(),
        "followers": config.followers_url(username).to_string(),
        "following": config.following_url(username).to_string(),
        "endpoints": {
            "sharedInbox": config.shared_inbox_url().to_string(),
        },
        "attachment": attachment_fields(&actor.field_htmls),
    });

    if let Some(avatar) = &actor.avatar_url {
        person["icon"] = json!({"type": "Image", "url": avatar});
    }
    if let Some(header) = &actor.header_url {
        person["image"] = json!({"type": "Image", "url": header});
    }
    if let Some(published) = &actor.published_at {
        person["published"] = json!(published.to_rfc3339());
    }
    if let Some(pem) = public_key_pem {
        person["publicKey"] = json!({
            "id": config.public_key_url(username),
            "owner": actor_url.to_string(),
            "publicKeyPem": pem,
        });
    }

    person
}

/// Render the field map as `PropertyValue` attachments.
fn attachment_fields(field_htmls: &Value) -> Value {
    let fields = field_htmls
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(name, value)| {
                    json!({
                        "type": "PropertyValue",
                        "name": name,
                        "value": value,
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    json!(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use letterpress_db::entities::actor::ActorType;
    use url::Url;

    fn local_actor() -> actor::Model {
        actor::Model {
            id: "a1".to_string(),
            iri: "https://blog.example/users/alice".to_string(),
            actor_type: ActorType::Person,
            username: "alice".to_string(),
            instance_host: "blog.example".to_string(),
            handle_host: "blog.example".to_string(),
            blog_id: Some("b1".to_string()),
            name: Some("Alice's Blog".to_string()),
            bio_html: Some("<p>hello</p>".to_string()),
            avatar_url: Some("https://blog.example/media/avatar.png".to_string()),
            header_url: None,
            url: None,
            field_htmls: json!({"Website": "<a href=\"https://alice.example\">alice.example</a>"}),
            emojis: json!({}),
            tags: json!({}),
            aliases: json!([]),
            inbox_url: "https://blog.example/users/alice/inbox".to_string(),
            shared_inbox_url: Some("https://blog.example/inbox".to_string()),
            followers_url: Some("https://blog.example/users/alice/followers".to_string()),
            featured_url: None,
            followees_count: 0,
            followers_count: 3,
            posts_count: 7,
            successor_id: None,
            published_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_person_document() {
        let config = UrlConfig::new(Url::parse("https://blog.example").unwrap());
        let person = actor_to_person(&local_actor(), &config, Some("PEM"));

        assert_eq!(person["type"], "Person");
        assert_eq!(person["id"], "https://blog.example/users/alice");
        assert_eq!(person["preferredUsername"], "alice");
        assert_eq!(person["inbox"], "https://blog.example/users/alice/inbox");
        assert_eq!(person["endpoints"]["sharedInbox"], "https://blog.example/inbox");
        assert_eq!(person["publicKey"]["publicKeyPem"], "PEM");
        assert_eq!(
            person["publicKey"]["id"],
            "https://blog.example/users/alice#main-key"
        );
        assert_eq!(person["attachment"][0]["type"], "PropertyValue");
        assert_eq!(person["attachment"][0]["name"], "Website");
    }

    #[test]
    fn test_person_without_key() {
        let config = UrlConfig::new(Url::parse("https://blog.example").unwrap());
        let person = actor_to_person(&local_actor(), &config, None);

        assert!(person.get("publicKey").is_none());
    }
}
