//! AES-256-GCM authenticated encryption.
//!
//! The nonce is generated by the caller (see [`generate_nonce`]) and stored
//! next to the ciphertext by the vault envelope, so `seal` and `open` work
//! on the nonce and the `ciphertext || tag` body separately.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{HbctlError, Result};

/// Size of the AES-256-GCM nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Generate a fresh random 12-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(&nonce);
    out
}

/// Encrypt `plaintext` with a 32-byte `key` under `nonce`.
///
/// Returns `ciphertext || 16-byte tag`.
pub fn seal(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| HbctlError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| HbctlError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt and authenticate data produced by `seal`.
///
/// Any tag mismatch (wrong key, flipped bit, truncated body) surfaces as
/// [`HbctlError::WrongPassphrase`], since the key always comes from the
/// operator's passphrase.
pub fn open(key: &[u8], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| HbctlError::WrongPassphrase)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| HbctlError::WrongPassphrase)
}
