//! Actor store.
//!
//! Unified resolve-or-create layer over local (blog-backed) and remote
//! actors. Remote actors are cached snapshots of their profile document,
//! refreshed whenever the document is re-persisted.

use chrono::Utc;
use letterpress_common::{AppResult, IdGenerator, generate_rsa_keypair};
use letterpress_db::{
    entities::{actor, actor_keypair, blog},
    repositories::{ActorKeypairRepository, ActorRepository},
};
use sea_orm::Set;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::ApClient;
use crate::convert::UrlConfig;
use crate::instance::InstanceService;

/// How many migration hops a `movedTo` chain may take.
///
/// Each hop is trusted only when the successor lists the predecessor among
/// its aliases, and the bound keeps a malicious chain from recursing
/// unboundedly.
const MAX_SUCCESSOR_DEPTH: u8 = 2;

/// Resolve-or-create store for federation actors.
#[derive(Clone)]
pub struct ActorStore {
    actor_repo: ActorRepository,
    keypair_repo: ActorKeypairRepository,
    instance_service: InstanceService,
    client: ApClient,
    urls: UrlConfig,
    id_gen: IdGenerator,
}

impl ActorStore {
    /// Create a new actor store.
    #[must_use]
    pub fn new(
        actor_repo: ActorRepository,
        keypair_repo: ActorKeypairRepository,
        instance_service: InstanceService,
        client: ApClient,
        urls: UrlConfig,
    ) -> Self {
        Self {
            actor_repo,
            keypair_repo,
            instance_service,
            client,
            urls,
            id_gen: IdGenerator::new(),
        }
    }

    /// Direct lookup by IRI. No network I/O.
    pub async fn get_persisted_actor(&self, iri: &Url) -> AppResult<Option<actor::Model>> {
        self.actor_repo.find_by_iri(iri.as_str()).await
    }

    /// Resolve an actor IRI to a persisted row, fetching and caching the
    /// remote profile document when necessary.
    ///
    /// Returns `Ok(None)` when the actor cannot be resolved; callers must
    /// treat that as "skip this activity".
    pub async fn resolve_actor(&self, iri: &Url) -> AppResult<Option<actor::Model>> {
        // A local-origin IRI must already exist; fabricating a second local
        // actor from a self-referential activity is never allowed.
        if self.urls.is_local(iri) {
            let actor = self.actor_repo.find_by_iri(iri.as_str()).await?;
            if actor.is_none() {
                warn!(iri = %iri, "Local actor IRI does not match any persisted actor");
            }
            return Ok(actor);
        }

        if let Some(actor) = self.actor_repo.find_by_iri(iri.as_str()).await? {
            debug!(iri = %iri, "Found existing remote actor");
            return Ok(Some(actor));
        }

        info!(iri = %iri, "Fetching remote actor");
        let doc = match self.client.fetch_actor(iri.as_str()).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(iri = %iri, error = %e, "Failed to fetch remote actor");
                return Ok(None);
            }
        };

        self.persist_actor_document(&doc, iri, 0).await
    }

    /// Persist a fetched actor document, upserting by IRI.
    ///
    /// Everything here is best-effort except identity: an actor whose handle
    /// cannot be computed yields `Ok(None)` and the caller must no-op.
    pub async fn persist_actor_document(
        &self,
        doc: &Value,
        iri: &Url,
        depth: u8,
    ) -> AppResult<Option<actor::Model>> {
        if self.urls.is_local(iri) {
            return self.actor_repo.find_by_iri(iri.as_str()).await;
        }

        let Some(host) = iri.host_str() else {
            return Ok(None);
        };
        let host = host.to_string();

        self.instance_service.persist_instance(&host, true).await?;

        let Some((username, handle_host)) = self.compute_handle(doc, iri).await else {
            warn!(iri = %iri, "Cannot compute handle for actor, skipping");
            return Ok(None);
        };

        let actor_type = doc
            .get("type")
            .and_then(Value::as_str)
            .and_then(actor::ActorType::parse)
            .unwrap_or(actor::ActorType::Person);

        // Independent remote reads: fan out, join, suppress per-call errors.
        let (followers_total, followees_total, posts_total) = futures::join!(
            self.collection_total(doc.get("followers")),
            self.collection_total(doc.get("following")),
            self.collection_total(doc.get("outbox")),
        );

        let (tags, emojis) = collect_tags(doc);
        let field_htmls = collect_attachment_fields(doc);
        let aliases = collect_aliases(doc);

        let inbox_url = doc.get("inbox").and_then(Value::as_str).map(String::from);
        let Some(inbox_url) = inbox_url else {
            warn!(iri = %iri, "Actor document has no inbox, skipping");
            return Ok(None);
        };

        let shared_inbox_url = doc
            .get("endpoints")
            .and_then(|e| e.get("sharedInbox"))
            .and_then(Value::as_str)
            .map(String::from);

        let successor_id = self.resolve_successor(doc, iri, depth).await;

        let name = doc.get("name").and_then(Value::as_str).map(String::from);
        let bio_html = doc.get("summary").and_then(Value::as_str).map(String::from);
        let avatar_url = extract_image_url(doc.get("icon"));
        let header_url = extract_image_url(doc.get("image"));
        let url = doc.get("url").and_then(Value::as_str).map(String::from);
        let followers_url = doc.get("followers").and_then(Value::as_str).map(String::from);
        let featured_url = doc.get("featured").and_then(Value::as_str).map(String::from);
        let published_at = doc
            .get("published")
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok());

        let now = Utc::now().fixed_offset();

        if let Some(existing) = self.actor_repo.find_by_iri(iri.as_str()).await? {
            // Field-level last write wins; counter snapshots survive a
            // failed collection fetch (no fetch, no refresh).
            let mut active: actor::ActiveModel = existing.clone().into();
            active.actor_type = Set(actor_type);
            active.username = Set(username);
            active.instance_host = Set(host);
            active.handle_host = Set(handle_host);
            active.name = Set(name);
            active.bio_html = Set(bio_html);
            active.avatar_url = Set(avatar_url);
            active.header_url = Set(header_url);
            active.url = Set(url);
            active.field_htmls = Set(field_htmls);
            active.emojis = Set(emojis);
            active.tags = Set(tags);
            active.aliases = Set(aliases);
            active.inbox_url = Set(inbox_url);
            active.shared_inbox_url = Set(shared_inbox_url);
            active.followers_url = Set(followers_url);
            active.featured_url = Set(featured_url);
            active.followers_count = Set(count_or(followers_total, existing.followers_count));
            active.followees_count = Set(count_or(followees_total, existing.followees_count));
            active.posts_count = Set(count_or(posts_total, existing.posts_count));
            active.successor_id = Set(successor_id);
            active.published_at = Set(published_at);
            active.updated_at = Set(Some(now));

            let updated = self.actor_repo.update(active).await?;
            debug!(iri = %iri, "Refreshed remote actor");
            return Ok(Some(updated));
        }

        let model = actor::ActiveModel {
            id: Set(self.id_gen.generate()),
            iri: Set(iri.to_string()),
            actor_type: Set(actor_type),
            username: Set(username),
            instance_host: Set(host),
            handle_host: Set(handle_host),
            blog_id: Set(None),
            name: Set(name),
            bio_html: Set(bio_html),
            avatar_url: Set(avatar_url),
            header_url: Set(header_url),
            url: Set(url),
            field_htmls: Set(field_htmls),
            emojis: Set(emojis),
            tags: Set(tags),
            aliases: Set(aliases),
            inbox_url: Set(inbox_url),
            shared_inbox_url: Set(shared_inbox_url),
            followers_url: Set(followers_url),
            featured_url: Set(featured_url),
            followers_count: Set(count_or(followers_total, 0)),
            followees_count: Set(count_or(followees_total, 0)),
            posts_count: Set(count_or(posts_total, 0)),
            successor_id: Set(successor_id),
            published_at: Set(published_at),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let created = self.actor_repo.create(model).await?;
        info!(
            actor_id = %created.id,
            handle = %created.handle(),
            "Created remote actor"
        );

        Ok(Some(created))
    }

    /// Provision the actor row and signing keypair for a new blog.
    pub async fn provision_local_actor(&self, blog: &blog::Model) -> AppResult<actor::Model> {
        let iri = self.urls.user_url(&blog.slug);
        let host = self
            .urls
            .base_url
            .host_str()
            .unwrap_or_default()
            .to_string();
        let now = Utc::now().fixed_offset();

        let model = actor::ActiveModel {
            id: Set(self.id_gen.generate()),
            iri: Set(iri.to_string()),
            actor_type: Set(actor::ActorType::Person),
            username: Set(blog.slug.clone()),
            instance_host: Set(host.clone()),
            handle_host: Set(host),
            blog_id: Set(Some(blog.id.clone())),
            name: Set(Some(blog.title.clone())),
            bio_html: Set(blog.description.clone()),
            avatar_url: Set(None),
            header_url: Set(None),
            url: Set(Some(self.urls.blog_page_url(&blog.slug).to_string())),
            field_htmls: Set(json!({})),
            emojis: Set(json!({})),
            tags: Set(json!({})),
            aliases: Set(json!([])),
            inbox_url: Set(self.urls.inbox_url(&blog.slug).to_string()),
            shared_inbox_url: Set(Some(self.urls.shared_inbox_url().to_string())),
            followers_url: Set(Some(self.urls.followers_url(&blog.slug).to_string())),
            featured_url: Set(None),
            followers_count: Set(0),
            followees_count: Set(0),
            posts_count: Set(0),
            successor_id: Set(None),
            published_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let created = self.actor_repo.create(model).await?;

        let keypair = generate_rsa_keypair()?;
        self.keypair_repo
            .create(actor_keypair::ActiveModel {
                actor_id: Set(created.id.clone()),
                public_key: Set(keypair.public_key_pem),
                private_key: Set(keypair.private_key_pem),
                key_id: Set(self.urls.public_key_url(&blog.slug)),
                created_at: Set(now),
            })
            .await?;

        info!(actor_id = %created.id, slug = %blog.slug, "Provisioned local actor");
        Ok(created)
    }

    /// Compute the `@user@host` handle for a remote actor.
    ///
    /// WebFinger gives the canonical handle host; on any lookup failure the
    /// document's `preferredUsername` and the IRI host stand in. No
    /// username at all means no identity.
    async fn compute_handle(&self, doc: &Value, iri: &Url) -> Option<(String, String)> {
        let username = doc.get("preferredUsername").and_then(Value::as_str)?;
        let host = iri.host_str()?;

        if let Ok(jrd) = self.client.webfinger(host, iri.as_str()).await {
            if let Some(acct) = jrd
                .get("subject")
                .and_then(Value::as_str)
                .and_then(parse_acct)
            {
                return Some(acct);
            }
        }

        Some((username.to_string(), host.to_string()))
    }

    /// Best-effort fetch of a collection's `totalItems`.
    async fn collection_total(&self, collection: Option<&Value>) -> Option<u64> {
        let url = collection?.as_str()?;
        match self.client.fetch_collection_total(url).await {
            Ok(total) => total,
            Err(e) => {
                debug!(url = %url, error = %e, "Collection summary fetch failed");
                None
            }
        }
    }

    /// Resolve a `movedTo` successor, bounded by [`MAX_SUCCESSOR_DEPTH`].
    ///
    /// The successor is trusted only when its alias list names this actor's
    /// IRI.
    async fn resolve_successor(&self, doc: &Value, iri: &Url, depth: u8) -> Option<String> {
        let moved_to = doc.get("movedTo").and_then(Value::as_str)?;
        let successor_iri = Url::parse(moved_to).ok()?;

        if depth >= MAX_SUCCESSOR_DEPTH {
            warn!(
                iri = %iri,
                successor = %successor_iri,
                "Successor chain exceeds depth bound, ignoring"
            );
            return None;
        }

        if successor_iri == *iri {
            return None;
        }

        let successor_doc = match self.client.fetch_actor(successor_iri.as_str()).await {
            Ok(doc) => doc,
            Err(e) => {
                debug!(successor = %successor_iri, error = %e, "Successor fetch failed");
                return None;
            }
        };

        if !alias_list_contains(&successor_doc, iri) {
            warn!(
                iri = %iri,
                successor = %successor_iri,
                "Successor does not alias this actor, ignoring migration"
            );
            return None;
        }

        let successor = Box::pin(self.persist_actor_document(&successor_doc, &successor_iri, depth + 1))
            .await
            .ok()
            .flatten()?;

        Some(successor.id)
    }
}

/// Clamp an optional remote count to `i32`, falling back when unfetched.
fn count_or(total: Option<u64>, fallback: i32) -> i32 {
    total.map_or(fallback, |n| i32::try_from(n).unwrap_or(i32::MAX))
}

/// Parse a WebFinger `acct:` subject into `(username, host)`.
fn parse_acct(subject: &str) -> Option<(String, String)> {
    let rest = subject.strip_prefix("acct:")?;
    let (user, host) = rest.split_once('@')?;
    if user.is_empty() || host.is_empty() || host.contains('@') {
        return None;
    }
    Some((user.to_string(), host.to_string()))
}

/// Whether an actor document's `alsoKnownAs` names the given IRI.
fn alias_list_contains(doc: &Value, iri: &Url) -> bool {
    match doc.get("alsoKnownAs") {
        Some(Value::Array(aliases)) => aliases
            .iter()
            .any(|alias| alias.as_str() == Some(iri.as_str())),
        Some(Value::String(alias)) => alias == iri.as_str(),
        _ => false,
    }
}

/// Collect hashtag and custom emoji tags from an actor document.
///
/// Hashtag names are lowercased; emoji entries are kept only when the icon
/// resolves to a usable URL.
fn collect_tags(doc: &Value) -> (Value, Value) {
    let mut tags = Map::new();
    let mut emojis = Map::new();

    if let Some(tag_list) = doc.get("tag").and_then(Value::as_array) {
        for tag in tag_list {
            let kind = tag.get("type").and_then(Value::as_str).unwrap_or_default();
            let name = tag.get("name").and_then(Value::as_str);

            match (kind, name) {
                ("Hashtag", Some(name)) => {
                    if let Some(href) = tag.get("href").and_then(Value::as_str) {
                        let name = name.trim_start_matches('#').to_lowercase();
                        tags.insert(name, json!(href));
                    }
                }
                ("Emoji", Some(name)) => {
                    let icon_url = tag
                        .get("icon")
                        .and_then(|icon| icon.get("url"))
                        .and_then(Value::as_str)
                        .filter(|url| Url::parse(url).is_ok());
                    if let Some(icon_url) = icon_url {
                        emojis.insert(name.to_string(), json!(icon_url));
                    }
                }
                _ => {}
            }
        }
    }

    (Value::Object(tags), Value::Object(emojis))
}

/// Collect `PropertyValue` attachments into a name -> HTML map.
fn collect_attachment_fields(doc: &Value) -> Value {
    let mut fields = Map::new();

    if let Some(attachments) = doc.get("attachment").and_then(Value::as_array) {
        for attachment in attachments {
            let is_property = attachment.get("type").and_then(Value::as_str) == Some("PropertyValue");
            if !is_property {
                continue;
            }
            if let (Some(name), Some(value)) = (
                attachment.get("name").and_then(Value::as_str),
                attachment.get("value").and_then(Value::as_str),
            ) {
                fields.insert(name.to_string(), json!(value));
            }
        }
    }

    Value::Object(fields)
}

/// Collect `alsoKnownAs` into a JSON array of IRI strings.
fn collect_aliases(doc: &Value) -> Value {
    match doc.get("alsoKnownAs") {
        Some(Value::Array(aliases)) => Value::Array(
            aliases
                .iter()
                .filter(|alias| alias.is_string())
                .cloned()
                .collect(),
        ),
        Some(Value::String(alias)) => json!([alias]),
        _ => json!([]),
    }
}

/// Extract an image URL from an `icon`/`image` field, which may be an
/// object or a bare string.
fn extract_image_url(value: Option<&Value>) -> Option<String> {
    let value = value?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    value
        .get("url")
        .and_then(Value::as_str)
        .map(String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_acct() {
        assert_eq!(
            parse_acct("acct:bob@remote.example"),
            Some(("bob".to_string(), "remote.example".to_string()))
        );
        assert_eq!(parse_acct("bob@remote.example"), None);
        assert_eq!(parse_acct("acct:bob"), None);
        assert_eq!(parse_acct("acct:@remote.example"), None);
    }

    #[test]
    fn test_collect_tags() {
        let doc = json!({
            "tag": [
                {"type": "Hashtag", "name": "#RustLang", "href": "https://remote.example/tags/rustlang"},
                {"type": "Emoji", "name": ":blobcat:", "icon": {"type": "Image", "url": "https://remote.example/emoji/blobcat.png"}},
                {"type": "Emoji", "name": ":broken:", "icon": {"type": "Image", "url": "not a url"}},
                {"type": "Mention", "name": "@alice@blog.example", "href": "https://blog.example/users/alice"}
            ]
        });

        let (tags, emojis) = collect_tags(&doc);

        assert_eq!(tags["rustlang"], "https://remote.example/tags/rustlang");
        assert_eq!(emojis[":blobcat:"], "https://remote.example/emoji/blobcat.png");
        assert!(emojis.get(":broken:").is_none());
        assert_eq!(tags.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_collect_attachment_fields() {
        let doc = json!({
            "attachment": [
                {"type": "PropertyValue", "name": "Website", "value": "<a href=\"https://bob.example\">bob.example</a>"},
                {"type": "Image", "url": "https://remote.example/pic.png"}
            ]
        });

        let fields = collect_attachment_fields(&doc);
        assert_eq!(fields.as_object().unwrap().len(), 1);
        assert!(fields["Website"].as_str().unwrap().contains("bob.example"));
    }

    #[test]
    fn test_alias_list_contains() {
        let iri = Url::parse("https://old.example/users/bob").unwrap();

        let doc = json!({"alsoKnownAs": ["https://old.example/users/bob"]});
        assert!(alias_list_contains(&doc, &iri));

        let doc = json!({"alsoKnownAs": "https://old.example/users/bob"});
        assert!(alias_list_contains(&doc, &iri));

        let doc = json!({"alsoKnownAs": ["https://elsewhere.example/users/bob"]});
        assert!(!alias_list_contains(&doc, &iri));

        let doc = json!({});
        assert!(!alias_list_contains(&doc, &iri));
    }

    #[test]
    fn test_extract_image_url() {
        assert_eq!(
            extract_image_url(Some(&json!({"type": "Image", "url": "https://x.example/a.png"}))),
            Some("https://x.example/a.png".to_string())
        );
        assert_eq!(
            extract_image_url(Some(&json!("https://x.example/a.png"))),
            Some("https://x.example/a.png".to_string())
        );
        assert_eq!(extract_image_url(None), None);
    }

    #[test]
    fn test_count_or() {
        assert_eq!(count_or(Some(12), 5), 12);
        assert_eq!(count_or(None, 5), 5);
        assert_eq!(count_or(Some(u64::MAX), 0), i32::MAX);
    }
}
