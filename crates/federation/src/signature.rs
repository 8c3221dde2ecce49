//! HTTP Signature implementation for `ActivityPub`.
//!
//! Implements draft-cavage-http-signatures for signing and verifying
//! federation requests. The signing string is always built from the declared
//! ordered header list, never derived from the request itself: a remote
//! signer's canonical string must be reconstructed byte for byte.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use reqwest::header::{HeaderMap, HeaderValue};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::{SigningKey, VerifyingKey},
};
use sha2::{Digest, Sha256};
use signature::{SignatureEncoding, Signer, Verifier};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// HTTP Signature error.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
    #[error("Missing header: {0}")]
    MissingHeader(String),
    #[error("Invalid signature header")]
    InvalidSignatureHeader,
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid header value")]
    InvalidHeaderValue,
}

/// Parsed signature header components.
#[derive(Debug, Clone)]
pub struct SignatureComponents {
    pub key_id: String,
    pub algorithm: String,
    pub headers: Vec<String>,
    pub signature: String,
}

/// HTTP Signature signer for outgoing requests.
pub struct HttpSigner {
    private_key: RsaPrivateKey,
    key_id: String,
}

impl HttpSigner {
    /// Create a new HTTP signer from a PEM-encoded private key.
    pub fn new(private_key_pem: &str, key_id: String) -> Result<Self, SignatureError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self {
            private_key,
            key_id,
        })
    }

    /// Sign an HTTP request and return the headers to attach.
    ///
    /// Signs `(request-target)`, `host`, `date` and, when a body is present,
    /// `digest`.
    pub fn sign_request(
        &self,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<HeaderMap, SignatureError> {
        let mut headers = HeaderMap::new();

        let host = url
            .host_str()
            .ok_or_else(|| SignatureError::InvalidUrl("No host in URL".to_string()))?;
        let path = url.path();
        let query = url.query().map_or(String::new(), |q| format!("?{q}"));
        let request_target = format!("{} {path}{query}", method.to_lowercase());

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let digest = body.map(calculate_digest);

        let mut signed_headers = vec!["(request-target)", "host", "date"];
        if digest.is_some() {
            signed_headers.push("digest");
        }

        let mut signing_parts = Vec::new();
        for header in &signed_headers {
            let value = match *header {
                "(request-target)" => request_target.clone(),
                "host" => host.to_string(),
                "date" => date.clone(),
                "digest" => digest.clone().unwrap_or_default(),
                h => {
                    return Err(SignatureError::MissingHeader(h.to_string()));
                }
            };
            signing_parts.push(format!("{header}: {value}"));
        }
        let signing_string = signing_parts.join("\n");

        debug!(signing_string = %signing_string, "Signing string");

        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let signature_bytes = signing_key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
        let signature = BASE64.encode(signature_bytes.to_bytes());

        let signature_header = format!(
            "keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            signed_headers.join(" "),
            signature
        );

        headers.insert(
            "Host",
            HeaderValue::from_str(host).map_err(|_| SignatureError::InvalidHeaderValue)?,
        );
        headers.insert(
            "Date",
            HeaderValue::from_str(&date).map_err(|_| SignatureError::InvalidHeaderValue)?,
        );
        if let Some(ref d) = digest {
            headers.insert(
                "Digest",
                HeaderValue::from_str(d).map_err(|_| SignatureError::InvalidHeaderValue)?,
            );
        }
        headers.insert(
            "Signature",
            HeaderValue::from_str(&signature_header)
                .map_err(|_| SignatureError::InvalidHeaderValue)?,
        );

        Ok(headers)
    }
}

/// HTTP Signature verifier for incoming requests.
pub struct HttpVerifier;

impl HttpVerifier {
    /// Parse the Signature header into components.
    ///
    /// Format: `keyId="...",algorithm="...",headers="...",signature="..."`
    pub fn parse_signature_header(header: &str) -> Result<SignatureComponents, SignatureError> {
        let mut key_id = None;
        let mut algorithm = None;
        let mut headers_list = None;
        let mut signature = None;

        for part in header.split(',') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                let value = value.trim_matches('"');
                match key {
                    "keyId" => key_id = Some(value.to_string()),
                    "algorithm" => algorithm = Some(value.to_string()),
                    "headers" => headers_list = Some(value.to_string()),
                    "signature" => signature = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        Ok(SignatureComponents {
            key_id: key_id.ok_or(SignatureError::InvalidSignatureHeader)?,
            algorithm: algorithm.unwrap_or_else(|| "rsa-sha256".to_string()),
            headers: headers_list
                .unwrap_or_else(|| "date".to_string())
                .split(' ')
                .map(String::from)
                .collect(),
            signature: signature.ok_or(SignatureError::InvalidSignatureHeader)?,
        })
    }

    /// Verify an HTTP signature using the given public key.
    ///
    /// RSA-SHA256 is the only algorithm observed in federation traffic;
    /// anything else is rejected outright.
    pub fn verify(
        public_key_pem: &str,
        components: &SignatureComponents,
        method: &str,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> Result<bool, SignatureError> {
        if components.algorithm != "rsa-sha256" && components.algorithm != "hs2019" {
            return Err(SignatureError::UnsupportedAlgorithm(
                components.algorithm.clone(),
            ));
        }

        let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

        let mut signing_parts = Vec::new();
        for header in &components.headers {
            let value = match header.as_str() {
                "(request-target)" => format!("{} {path}", method.to_lowercase()),
                h => headers
                    .get(h)
                    .ok_or_else(|| SignatureError::MissingHeader(h.to_string()))?
                    .clone(),
            };
            signing_parts.push(format!("{header}: {value}"));
        }
        let signing_string = signing_parts.join("\n");

        debug!(signing_string = %signing_string, "Verifying signing string");

        let signature_bytes = BASE64
            .decode(&components.signature)
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;

        let verifying_key = VerifyingKey::<Sha256>::new(public_key);
        let signature = rsa::pkcs1v15::Signature::try_from(signature_bytes.as_slice())
            .map_err(|e| SignatureError::VerificationFailed(e.to_string()))?;

        match verifying_key.verify(signing_string.as_bytes(), &signature) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "Signature verification failed");
                Ok(false)
            }
        }
    }
}

/// Calculate the `SHA-256=` digest header value for a body.
#[must_use]
pub fn calculate_digest(body: &[u8]) -> String {
    let hash = Sha256::digest(body);
    format!("SHA-256={}", BASE64.encode(hash))
}

/// Verify that a digest header matches the body.
#[must_use]
pub fn verify_digest(body: &[u8], digest_header: &str) -> bool {
    calculate_digest(body) == digest_header
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn generate_test_keypair() -> (String, String) {
        use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let public_pem = public_key.to_public_key_pem(LineEnding::LF).unwrap();

        (private_pem.to_string(), public_pem)
    }

    fn headers_for_verification(headers: &HeaderMap) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for (name, value) in headers {
            map.insert(
                name.as_str().to_lowercase(),
                value.to_str().unwrap().to_string(),
            );
        }
        map
    }

    #[test]
    fn test_sign_and_verify() {
        let (private_pem, public_pem) = generate_test_keypair();

        let signer = HttpSigner::new(
            &private_pem,
            "https://blog.example/users/alice#main-key".to_string(),
        )
        .unwrap();

        let url = Url::parse("https://remote.example/inbox").unwrap();
        let body = b"{\"type\":\"Accept\"}";

        let headers = signer.sign_request("POST", &url, Some(body)).unwrap();

        let sig_header = headers.get("Signature").unwrap().to_str().unwrap();
        let components = HttpVerifier::parse_signature_header(sig_header).unwrap();

        let verify_headers = headers_for_verification(&headers);
        let result =
            HttpVerifier::verify(&public_pem, &components, "POST", "/inbox", &verify_headers)
                .unwrap();

        assert!(result);
    }

    #[test]
    fn test_tampered_body_fails_digest() {
        let (private_pem, _) = generate_test_keypair();

        let signer = HttpSigner::new(
            &private_pem,
            "https://blog.example/users/alice#main-key".to_string(),
        )
        .unwrap();

        let url = Url::parse("https://remote.example/inbox").unwrap();
        let headers = signer
            .sign_request("POST", &url, Some(b"original body"))
            .unwrap();

        let digest = headers.get("Digest").unwrap().to_str().unwrap();
        assert!(verify_digest(b"original body", digest));
        assert!(!verify_digest(b"tampered body", digest));
    }

    #[test]
    fn test_tampered_header_fails_verification() {
        let (private_pem, public_pem) = generate_test_keypair();

        let signer = HttpSigner::new(
            &private_pem,
            "https://blog.example/users/alice#main-key".to_string(),
        )
        .unwrap();

        let url = Url::parse("https://remote.example/inbox").unwrap();
        let headers = signer.sign_request("POST", &url, Some(b"body")).unwrap();

        let sig_header = headers.get("Signature").unwrap().to_str().unwrap();
        let components = HttpVerifier::parse_signature_header(sig_header).unwrap();

        let mut verify_headers = headers_for_verification(&headers);
        // A different digest means a different signing string.
        verify_headers.insert("digest".to_string(), calculate_digest(b"other"));

        let result =
            HttpVerifier::verify(&public_pem, &components, "POST", "/inbox", &verify_headers)
                .unwrap();

        assert!(!result);
    }

    #[test]
    fn test_parse_signature_header() {
        let header = r#"keyId="https://remote.example/users/bob#main-key",algorithm="rsa-sha256",headers="(request-target) host date digest",signature="abc123==""#;

        let components = HttpVerifier::parse_signature_header(header).unwrap();

        assert_eq!(components.key_id, "https://remote.example/users/bob#main-key");
        assert_eq!(components.algorithm, "rsa-sha256");
        assert_eq!(
            components.headers,
            vec!["(request-target)", "host", "date", "digest"]
        );
        assert_eq!(components.signature, "abc123==");
    }

    #[test]
    fn test_parse_signature_header_missing_key_id() {
        let header = r#"algorithm="rsa-sha256",signature="abc""#;
        assert!(HttpVerifier::parse_signature_header(header).is_err());
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let components = SignatureComponents {
            key_id: "https://remote.example/users/bob#main-key".to_string(),
            algorithm: "rsa-md5".to_string(),
            headers: vec!["date".to_string()],
            signature: "abc".to_string(),
        };

        let (_, public_pem) = generate_test_keypair();
        let result = HttpVerifier::verify(
            &public_pem,
            &components,
            "POST",
            "/inbox",
            &HashMap::new(),
        );

        assert!(matches!(
            result,
            Err(SignatureError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_calculate_digest() {
        let digest = calculate_digest(b"hello world");
        assert!(digest.starts_with("SHA-256="));
    }
}
