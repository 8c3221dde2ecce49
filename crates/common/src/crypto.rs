//! Cryptographic key material for `ActivityPub` signatures.
//!
//! Every local actor (one per blog) owns an RSA key pair used to sign
//! outbound federation requests. Keys are stored as exportable PEM text so
//! the signing layer can reconstruct them on demand.

use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding},
};

use crate::{AppError, AppResult};

/// RSA key pair for `ActivityPub` HTTP Signatures.
///
/// The private key uses PKCS#8 encoding and the public key SPKI encoding,
/// both as PEM text.
#[derive(Debug, Clone)]
pub struct RsaKeypair {
    /// Public key in PEM format (SPKI encoding).
    pub public_key_pem: String,
    /// Private key in PEM format (PKCS#8 encoding).
    pub private_key_pem: String,
}

/// Default RSA key size (2048 bits).
const RSA_KEY_SIZE: usize = 2048;

/// Generate a new RSA key pair for `ActivityPub` HTTP Signatures.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if key generation or PEM encoding fails.
pub fn generate_rsa_keypair() -> AppResult<RsaKeypair> {
    let mut rng = rand::thread_rng();

    let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_SIZE)
        .map_err(|e| AppError::Internal(format!("Failed to generate RSA key: {e}")))?;

    let public_key = RsaPublicKey::from(&private_key);

    let private_key_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode private key: {e}")))?
        .to_string();

    let public_key_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| AppError::Internal(format!("Failed to encode public key: {e}")))?;

    Ok(RsaKeypair {
        public_key_pem,
        private_key_pem,
    })
}

/// Parse an RSA private key from PKCS#8 PEM text.
pub fn parse_private_key(pem: &str) -> AppResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .map_err(|e| AppError::Internal(format!("Failed to parse private key: {e}")))
}

/// Parse an RSA public key from SPKI PEM text.
pub fn parse_public_key(pem: &str) -> AppResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .map_err(|e| AppError::Internal(format!("Failed to parse public key: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_keypair() {
        let keypair = generate_rsa_keypair().unwrap();

        assert!(keypair.public_key_pem.contains("BEGIN PUBLIC KEY"));
        assert!(keypair.public_key_pem.contains("END PUBLIC KEY"));
        assert!(keypair.private_key_pem.contains("BEGIN PRIVATE KEY"));
        assert!(keypair.private_key_pem.contains("END PRIVATE KEY"));
    }

    #[test]
    fn test_parse_generated_keys() {
        let keypair = generate_rsa_keypair().unwrap();

        let _private = parse_private_key(&keypair.private_key_pem).unwrap();
        let _public = parse_public_key(&keypair.public_key_pem).unwrap();
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_private_key("not a key").is_err());
        assert!(parse_public_key("not a key").is_err());
    }
}
