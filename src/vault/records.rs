//! Credential records kept in the vault.
//!
//! The decrypted vault is a single JSON [`Store`] with one optional slot per
//! record kind.  Saving one kind never touches the others.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::crypto::service_keys;
use crate::errors::{HbctlError, Result};

/// The kinds of record the vault can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Mongo,
    SigningSecret,
    ServiceKeyPair,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mongo => "mongodb secret",
            Self::SigningSecret => "jwt signing secret",
            Self::ServiceKeyPair => "service keypair",
        })
    }
}

/// The decrypted vault document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongodb: Option<MongoSecret>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<SigningSecret>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<ServiceKeyPair>,
}

impl Store {
    /// Return a copy of the `R` record, or `RecordNotStored`.
    pub fn get<R: Record>(&self) -> Result<R> {
        R::slot(self)
            .cloned()
            .ok_or(HbctlError::RecordNotStored(R::KIND))
    }
}

/// A record type with a dedicated slot in the [`Store`].
pub trait Record: Clone {
    const KIND: RecordKind;

    /// Reject records that would be useless once stored.
    fn validate(&self) -> Result<()>;

    fn slot(store: &Store) -> Option<&Self>;

    fn put(self, store: &mut Store);
}

// ---------------------------------------------------------------------------
// MongoSecret
// ---------------------------------------------------------------------------

/// Connection details for the operational database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoSecret {
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub auth_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set: Option<String>,
}

impl MongoSecret {
    /// URI that authenticates as the application user against `host`.
    pub fn app_uri(&self, host: &str) -> String {
        let mut uri = format!(
            "mongodb://{}:{}@{host}:{}/{}?authSource={}",
            escape_userinfo(&self.user),
            escape_userinfo(&self.password),
            self.port,
            self.database,
            self.auth_source,
        );
        if let Some(rs) = &self.replica_set {
            uri.push_str("&replicaSet=");
            uri.push_str(rs);
        }
        uri
    }
}

impl fmt::Debug for MongoSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoSecret")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_source", &self.auth_source)
            .finish_non_exhaustive()
    }
}

impl Record for MongoSecret {
    const KIND: RecordKind = RecordKind::Mongo;

    fn validate(&self) -> Result<()> {
        if self.user.is_empty() || self.password.is_empty() || self.host.is_empty() {
            return Err(HbctlError::InvalidRecord(
                "mongodb user, password, and host are required".into(),
            ));
        }
        if self.port == 0 {
            return Err(HbctlError::InvalidRecord("mongodb port cannot be 0".into()));
        }
        Ok(())
    }

    fn slot(store: &Store) -> Option<&Self> {
        store.mongodb.as_ref()
    }

    fn put(self, store: &mut Store) {
        store.mongodb = Some(self);
    }
}

/// Percent-encode a URI userinfo component (RFC 3986 unreserved set kept).
pub(crate) fn escape_userinfo(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// SigningSecret
// ---------------------------------------------------------------------------

/// HMAC key used to mint admin credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSecret {
    #[serde(rename = "jwt_secret")]
    pub secret: String,
}

impl SigningSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl Record for SigningSecret {
    const KIND: RecordKind = RecordKind::SigningSecret;

    fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(HbctlError::InvalidRecord(
                "jwt signing secret cannot be empty".into(),
            ));
        }
        Ok(())
    }

    fn slot(store: &Store) -> Option<&Self> {
        store.jwt.as_ref()
    }

    fn put(self, store: &mut Store) {
        store.jwt = Some(self);
    }
}

// ---------------------------------------------------------------------------
// ServiceKeyPair
// ---------------------------------------------------------------------------

/// RSA keypair the credential-issuing service signs service tokens with.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceKeyPair {
    pub public_key: String,
    pub private_key: String,
}

/// Where a PEM block comes from: given inline or read from a file.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Inline(String),
    File(PathBuf),
}

impl KeyMaterial {
    pub fn read(&self) -> Result<String> {
        match self {
            Self::Inline(pem) => Ok(pem.clone()),
            Self::File(path) => fs::read_to_string(path).map_err(|e| {
                HbctlError::InvalidPem(format!("cannot read {}: {e}", path.display()))
            }),
        }
    }
}

impl ServiceKeyPair {
    /// Generate a new keypair of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self> {
        let pair = service_keys::generate_keypair(bits)?;
        Ok(Self {
            public_key: pair.public_pem,
            private_key: pair.private_pem.to_string(),
        })
    }

    /// Load a keypair from inline PEM or PEM files, validating both halves.
    pub fn load(public: &KeyMaterial, private: &KeyMaterial) -> Result<Self> {
        let pair = Self {
            public_key: public.read()?,
            private_key: private.read()?,
        };
        pair.validate()?;
        Ok(pair)
    }
}

impl fmt::Debug for ServiceKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl Record for ServiceKeyPair {
    const KIND: RecordKind = RecordKind::ServiceKeyPair;

    fn validate(&self) -> Result<()> {
        service_keys::validate_public_key(&self.public_key)?;
        service_keys::validate_private_key(&self.private_key)
    }

    fn slot(store: &Store) -> Option<&Self> {
        store.service_key.as_ref()
    }

    fn put(self, store: &mut Store) {
        store.service_key = Some(self);
    }
}
