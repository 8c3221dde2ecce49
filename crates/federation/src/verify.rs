//! Inbound request signature verification.
//!
//! The one fetch in the federation core whose failure must hard-fail the
//! request: a bad or missing signature means HTTP 400 and zero side effects.

use axum::http::HeaderMap;
use letterpress_common::{AppError, AppResult};
use letterpress_db::repositories::{ActorKeypairRepository, ActorRepository};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::client::ApClient;
use crate::convert::UrlConfig;
use crate::signature::{HttpVerifier, verify_digest};

/// Verifies HTTP signatures on inbound federation requests.
#[derive(Clone)]
pub struct RequestVerifier {
    actor_repo: ActorRepository,
    keypair_repo: ActorKeypairRepository,
    client: ApClient,
    urls: UrlConfig,
}

impl RequestVerifier {
    /// Create a new request verifier.
    #[must_use]
    pub const fn new(
        actor_repo: ActorRepository,
        keypair_repo: ActorKeypairRepository,
        client: ApClient,
        urls: UrlConfig,
    ) -> Self {
        Self {
            actor_repo,
            keypair_repo,
            client,
            urls,
        }
    }

    /// Verify the signature on an inbound request.
    ///
    /// Returns the signer's actor IRI on success. Every failure maps to
    /// [`AppError::BadRequest`] so the caller rejects with 400 and no
    /// detail a probing server could learn from.
    pub async fn verify(
        &self,
        method: &str,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> AppResult<Url> {
        let signature_header = headers
            .get("signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing Signature header".to_string()))?;

        let components = HttpVerifier::parse_signature_header(signature_header)
            .map_err(|e| AppError::BadRequest(format!("Invalid signature header: {e}")))?;

        // A signed digest binds the signature to the body; check it first.
        if let Some(digest_header) = headers.get("digest").and_then(|v| v.to_str().ok()) {
            if !verify_digest(body, digest_header) {
                return Err(AppError::BadRequest("Digest mismatch".to_string()));
            }
        }

        let signer_iri = signer_actor_iri(&components.key_id)?;
        let public_key_pem = self.fetch_signer_public_key(&signer_iri).await?;

        let mut verify_headers = HashMap::new();
        for header_name in &components.headers {
            if header_name == "(request-target)" {
                continue;
            }
            if let Some(value) = headers
                .get(header_name.as_str())
                .and_then(|v| v.to_str().ok())
            {
                verify_headers.insert(header_name.clone(), value.to_string());
            }
        }

        let is_valid =
            HttpVerifier::verify(&public_key_pem, &components, method, path, &verify_headers)
                .map_err(|e| AppError::BadRequest(format!("Signature verification error: {e}")))?;

        if !is_valid {
            return Err(AppError::BadRequest("Invalid signature".to_string()));
        }

        debug!(key_id = %components.key_id, "Signature verified");
        Ok(signer_iri)
    }

    /// Fetch the public key the `keyId` refers to.
    ///
    /// Local actors read their stored keypair; remote actors are fetched
    /// from their origin (`Accept: application/activity+json`).
    async fn fetch_signer_public_key(&self, actor_iri: &Url) -> AppResult<String> {
        if self.urls.is_local(actor_iri) {
            if let Some(actor) = self.actor_repo.find_by_iri(actor_iri.as_str()).await? {
                if let Some(keypair) = self.keypair_repo.find_by_actor_id(&actor.id).await? {
                    return Ok(keypair.public_key);
                }
            }
            return Err(AppError::BadRequest("Unknown local signer".to_string()));
        }

        let doc = self
            .client
            .fetch_actor(actor_iri.as_str())
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to fetch signer: {e}")))?;

        doc.get("publicKey")
            .and_then(|pk| pk.get("publicKeyPem"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| AppError::BadRequest("Signer has no public key".to_string()))
    }
}

/// Derive the signer's actor IRI from a `keyId`.
///
/// Key ids are conventionally `https://host/users/name#main-key`; the actor
/// IRI is everything before the fragment.
fn signer_actor_iri(key_id: &str) -> AppResult<Url> {
    let actor_part = key_id.split('#').next().unwrap_or(key_id);
    Url::parse(actor_part).map_err(|e| AppError::BadRequest(format!("Invalid keyId: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_actor_iri_strips_fragment() {
        let iri = signer_actor_iri("https://remote.example/users/bob#main-key").unwrap();
        assert_eq!(iri.as_str(), "https://remote.example/users/bob");
    }

    #[test]
    fn test_signer_actor_iri_without_fragment() {
        let iri = signer_actor_iri("https://remote.example/users/bob").unwrap();
        assert_eq!(iri.as_str(), "https://remote.example/users/bob");
    }

    #[test]
    fn test_signer_actor_iri_rejects_garbage() {
        assert!(signer_actor_iri("not a url#main-key").is_err());
    }
}
