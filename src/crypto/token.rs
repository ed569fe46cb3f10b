//! HMAC-SHA256 signed admin credentials.
//!
//! The credential is a compact `header.payload.signature` triple where each
//! segment is base64url without padding, and the signature is
//! `HMAC-SHA256(signing_secret, "header.payload")`.  It authorizes the
//! bootstrap calls made against the credential-issuing service.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64URL;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::errors::{HbctlError, Result};

/// Lifetime of a minted admin credential.
pub const ADMIN_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

/// Claims carried by the bootstrap admin credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

impl AdminClaims {
    /// Bootstrap claims issued at `now`, expiring 24 hours later.
    pub fn bootstrap(now: DateTime<Utc>) -> Self {
        Self {
            sub: "hbctl-bootstrap".into(),
            email: "hbctl@local".into(),
            role: "admin".into(),
            typ: "user".into(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ADMIN_TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

/// Mint an admin credential signed with `secret`.
pub fn mint_admin_token(secret: &[u8], now: DateTime<Utc>) -> Result<String> {
    let header = Header {
        alg: "HS256",
        typ: "JWT",
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| HbctlError::SerializationError(format!("token header: {e}")))?;
    let claims_json = serde_json::to_vec(&AdminClaims::bootstrap(now))
        .map_err(|e| HbctlError::SerializationError(format!("token claims: {e}")))?;

    let signing_input = format!(
        "{}.{}",
        B64URL.encode(header_json),
        B64URL.encode(claims_json)
    );
    let signature = sign(secret, signing_input.as_bytes())?;

    Ok(format!("{signing_input}.{}", B64URL.encode(signature)))
}

/// Compute `HMAC-SHA256(secret, message)`.
pub fn sign(secret: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| HbctlError::EncryptionFailed(format!("HMAC init failed: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}
