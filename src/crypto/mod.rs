//! Cryptographic primitives for hbctl.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening (`encryption`)
//! - scrypt passphrase-based key derivation (`kdf`)
//! - RSA service keypair generation and PEM validation (`service_keys`)
//! - HMAC-SHA256 admin credential minting (`token`)

pub mod encryption;
pub mod kdf;
pub mod service_keys;
pub mod token;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_key, ...};
pub use encryption::{generate_nonce, open, seal, NONCE_LEN};
pub use kdf::{derive_key, generate_salt, DerivedKey, KdfParams, SALT_LEN};
pub use service_keys::{generate_keypair, validate_private_key, validate_public_key};
pub use token::{mint_admin_token, AdminClaims};
