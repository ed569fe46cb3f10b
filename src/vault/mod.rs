//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - Credential record types and the `Store` document (`records`)
//! - Binary vault file format (`format`)
//! - High-level `Vault` with passphrase handling (`store`)

pub mod format;
pub mod records;
pub mod store;

// Re-export the most commonly used items.
pub use records::{
    KeyMaterial, MongoSecret, Record, RecordKind, ServiceKeyPair, SigningSecret, Store,
};
pub use store::{PassphraseSource, Vault, PASSPHRASE_ENV};
