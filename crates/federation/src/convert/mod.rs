//! Conversion between database entities and `ActivityPub` documents.

#![allow(missing_docs)]
#![allow(clippy::expect_used)] // URL joins with known-valid paths cannot fail

mod actor;
mod post;

pub use actor::actor_to_person;
pub use post::{post_to_article, post_to_tombstone, wrap_post_activity};

use url::Url;

/// Configuration for generating and recognizing local federation URLs.
#[derive(Clone)]
pub struct UrlConfig {
    pub base_url: Url,
}

impl UrlConfig {
    /// Create a new URL config.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Local actor IRI for a blog slug.
    #[must_use]
    pub fn user_url(&self, username: &str) -> Url {
        self.base_url
            .join(&format!("/users/{username}"))
            .expect("valid URL")
    }

    /// Per-actor inbox URL.
    #[must_use]
    pub fn inbox_url(&self, username: &str) -> Url {
        self.base_url
            .join(&format!("/users/{username}/inbox"))
            .expect("valid URL")
    }

    /// Outbox URL.
    #[must_use]
    pub fn outbox_url(&self, username: &str) -> Url {
        self.base_url
            .join(&format!("/users/{username}/outbox"))
            .expect("valid URL")
    }

    /// Shared inbox URL.
    #[must_use]
    pub fn shared_inbox_url(&self) -> Url {
        self.base_url.join("/inbox").expect("valid URL")
    }

    /// Followers collection URL.
    #[must_use]
    pub fn followers_url(&self, username: &str) -> Url {
        self.base_url
            .join(&format!("/users/{username}/followers"))
            .expect("valid URL")
    }

    /// Following collection URL.
    #[must_use]
    pub fn following_url(&self, username: &str) -> Url {
        self.base_url
            .join(&format!("/users/{username}/following"))
            .expect("valid URL")
    }

    /// Public key id for a local actor.
    #[must_use]
    pub fn public_key_url(&self, username: &str) -> String {
        format!("{}#main-key", self.user_url(username))
    }

    /// Canonical federation object IRI for a post.
    #[must_use]
    pub fn object_url(&self, post_id: &str) -> Url {
        self.base_url
            .join(&format!("/objects/{post_id}"))
            .expect("valid URL")
    }

    /// Human-facing post page URL.
    #[must_use]
    pub fn post_page_url(&self, slug: &str, post_id: &str) -> Url {
        self.base_url
            .join(&format!("/@{slug}/{post_id}"))
            .expect("valid URL")
    }

    /// Human-facing blog page URL.
    #[must_use]
    pub fn blog_page_url(&self, slug: &str) -> Url {
        self.base_url.join(&format!("/@{slug}")).expect("valid URL")
    }

    /// Whether an IRI belongs to this instance.
    #[must_use]
    pub fn is_local(&self, iri: &Url) -> bool {
        iri.origin() == self.base_url.origin()
    }

    /// Extract the actor username from a local actor IRI.
    #[must_use]
    pub fn parse_user_iri(&self, iri: &Url) -> Option<String> {
        if !self.is_local(iri) {
            return None;
        }
        iri.path()
            .strip_prefix("/users/")
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(String::from)
    }

    /// Extract the post id from a local object IRI.
    #[must_use]
    pub fn parse_object_iri(&self, iri: &Url) -> Option<String> {
        if !self.is_local(iri) {
            return None;
        }
        iri.path()
            .strip_prefix("/objects/")
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(String::from)
    }
}
