//! Common utilities and shared types for letterpress.
//!
//! This crate provides the foundation used across all letterpress crates:
//!
//! - **Configuration**: application settings via [`Config`]
//! - **Error handling**: unified error types via [`AppError`] and [`AppResult`]
//! - **Cryptography**: RSA key material for `ActivityPub` HTTP Signatures
//! - **ID generation**: ULID-based unique identifiers via [`IdGenerator`]

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;

pub use config::Config;
pub use crypto::{RsaKeypair, generate_rsa_keypair, parse_private_key, parse_public_key};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
