//! `ActivityPub` HTTP client.
//!
//! Handles signed delivery to remote inboxes and the remote document
//! fetches (actors, objects, collections, WebFinger, nodeinfo) the
//! federation core depends on.

#![allow(missing_docs)]

use crate::signature::HttpSigner;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Error type for AP client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Signing failed: {0}")]
    SigningError(#[from] crate::signature::SignatureError),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Request failed: {status} - {body}")]
    RequestFailed { status: u16, body: String },
}

/// Software name and raw version reported by a remote nodeinfo document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfoSoftware {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// `ActivityPub` HTTP client.
#[derive(Clone)]
pub struct ApClient {
    client: Client,
    user_agent: String,
}

impl ApClient {
    /// Create a new AP client.
    pub fn new(instance_url: &str) -> Result<Self, ApClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let user_agent = format!(
            "letterpress/{} (+{instance_url})",
            env!("CARGO_PKG_VERSION")
        );

        Ok(Self { client, user_agent })
    }

    /// Deliver an activity to a remote inbox, signed with the given key.
    pub async fn deliver(
        &self,
        inbox_url: &Url,
        activity: &Value,
        private_key_pem: &str,
        key_id: &str,
    ) -> Result<(), ApClientError> {
        let body = serde_json::to_vec(activity)?;

        let signer = HttpSigner::new(private_key_pem, key_id.to_string())?;
        let headers = signer.sign_request("POST", inbox_url, Some(&body))?;

        debug!(
            inbox = %inbox_url,
            activity_type = activity.get("type").and_then(serde_json::Value::as_str).unwrap_or("Unknown"),
            "Delivering activity"
        );

        let response = self
            .client
            .post(inbox_url.clone())
            .headers(headers)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/activity+json")
            .header("Accept", "application/activity+json, application/ld+json")
            .body(body)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            info!(inbox = %inbox_url, status = %status, "Activity delivered");
            Ok(())
        } else if status.as_u16() == 410 {
            // 410 Gone - recipient is deleted, nothing to retry
            warn!(inbox = %inbox_url, "Remote inbox is gone (410)");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(
                inbox = %inbox_url,
                status = %status,
                body = %body,
                "Activity delivery failed"
            );
            Err(ApClientError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Fetch a remote actor document by its IRI.
    pub async fn fetch_actor(&self, actor_url: &str) -> Result<Value, ApClientError> {
        debug!(actor_url = %actor_url, "Fetching remote actor");
        self.fetch_json(
            actor_url,
            "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"",
        )
        .await
    }

    /// Fetch a remote object (note, article, activity) by its IRI.
    pub async fn fetch_object(&self, object_url: &str) -> Result<Value, ApClientError> {
        debug!(object_url = %object_url, "Fetching remote object");
        self.fetch_json(object_url, "application/activity+json, application/ld+json")
            .await
    }

    /// Fetch a collection document and return its `totalItems`, if any.
    pub async fn fetch_collection_total(
        &self,
        collection_url: &str,
    ) -> Result<Option<u64>, ApClientError> {
        let doc = self
            .fetch_json(collection_url, "application/activity+json, application/ld+json")
            .await?;
        Ok(doc.get("totalItems").and_then(Value::as_u64))
    }

    /// Perform a `WebFinger` lookup for a resource on a host.
    pub async fn webfinger(&self, host: &str, resource: &str) -> Result<Value, ApClientError> {
        let url = format!(
            "https://{host}/.well-known/webfinger?resource={}",
            urlencode(resource)
        );

        debug!(host = %host, resource = %resource, "Performing WebFinger lookup");
        self.fetch_json(&url, "application/jrd+json, application/json")
            .await
    }

    /// Discover a host's federation software via nodeinfo.
    ///
    /// Follows the well-known document to the first schema link it
    /// advertises and reads `software.name` / `software.version`.
    pub async fn fetch_nodeinfo(&self, host: &str) -> Result<NodeInfoSoftware, ApClientError> {
        let well_known = format!("https://{host}/.well-known/nodeinfo");
        let links = self.fetch_json(&well_known, "application/json").await?;

        let href = links
            .get("links")
            .and_then(Value::as_array)
            .and_then(|links| {
                links.iter().find_map(|link| {
                    let rel = link.get("rel").and_then(Value::as_str)?;
                    if rel.starts_with("http://nodeinfo.diaspora.software/ns/schema/") {
                        link.get("href").and_then(Value::as_str)
                    } else {
                        None
                    }
                })
            })
            .ok_or_else(|| ApClientError::InvalidUrl("No nodeinfo link".to_string()))?
            .to_string();

        let doc = self.fetch_json(&href, "application/json").await?;
        let software = doc.get("software");

        Ok(NodeInfoSoftware {
            name: software
                .and_then(|s| s.get("name"))
                .and_then(Value::as_str)
                .map(str::to_lowercase),
            version: software
                .and_then(|s| s.get("version"))
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    async fn fetch_json(&self, url: &str, accept: &str) -> Result<Value, ApClientError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApClientError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Percent-encode a WebFinger resource value.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
