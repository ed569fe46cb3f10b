//! Binary vault file format.
//!
//! A vault file has this layout:
//!
//! ```text
//! [salt: 16 bytes][nonce: 12 bytes][AES-256-GCM(store JSON) + 16-byte tag]
//! ```
//!
//! - **Salt**: scrypt salt for deriving the file key from the passphrase.
//! - **Nonce**: AES-GCM nonce.
//! - **Body**: the encrypted [`Store`] JSON, tag included.
//!
//! Salt and nonce are regenerated on every seal.

use zeroize::Zeroizing;

use super::records::Store;
use crate::crypto::{derive_key, generate_nonce, generate_salt, open, seal, KdfParams};
use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::errors::{HbctlError, Result};

/// Fixed-size prefix: salt + nonce.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// Serialize and encrypt `store` under `passphrase`.
pub fn seal_store(store: &Store, passphrase: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec_pretty(store)
            .map_err(|e| HbctlError::SerializationError(format!("store: {e}")))?,
    );

    let salt = generate_salt();
    let nonce = generate_nonce();
    let key = derive_key(passphrase, &salt, params)?;
    let body = seal(key.as_bytes(), &nonce, &plaintext)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(&salt); // 16 bytes
    buf.extend_from_slice(&nonce); // 12 bytes
    buf.extend_from_slice(&body); // ciphertext + tag
    Ok(buf)
}

/// Split a vault file into salt, nonce, and body without decrypting.
pub fn split(data: &[u8]) -> Result<(&[u8; SALT_LEN], &[u8; NONCE_LEN], &[u8])> {
    if data.len() < HEADER_LEN {
        return Err(HbctlError::CorruptVault(format!(
            "file is {} bytes, shorter than the {HEADER_LEN}-byte header",
            data.len()
        )));
    }

    let (salt, rest) = data.split_at(SALT_LEN);
    let (nonce, body) = rest.split_at(NONCE_LEN);

    let salt = salt
        .try_into()
        .map_err(|_| HbctlError::CorruptVault("bad salt".into()))?;
    let nonce = nonce
        .try_into()
        .map_err(|_| HbctlError::CorruptVault("bad nonce".into()))?;
    Ok((salt, nonce, body))
}

/// Decrypt a vault file and parse the store inside it.
///
/// A tag failure is `WrongPassphrase`; a short file or unparsable JSON
/// is `CorruptVault`.
pub fn open_store(data: &[u8], passphrase: &[u8], params: &KdfParams) -> Result<Store> {
    let (salt, nonce, body) = split(data)?;

    let key = derive_key(passphrase, salt, params)?;
    let plaintext = Zeroizing::new(open(key.as_bytes(), nonce, body)?);

    serde_json::from_slice(&plaintext)
        .map_err(|e| HbctlError::CorruptVault(format!("store JSON: {e}")))
}
