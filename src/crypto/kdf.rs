//! Passphrase-based key derivation using scrypt.
//!
//! The default profile is N=2^15, r=8, p=1, which costs roughly 32 MiB and a
//! few hundred milliseconds per derivation. Vault files written by earlier
//! hbctl releases use exactly this profile, so it must not change. The salt
//! is 16 random bytes, regenerated on every vault save.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{HbctlError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Smallest accepted `log_n` (N = 1024).
const MIN_LOG_N: u8 = 10;

/// scrypt cost parameters.
///
/// The vault file does not record these, so a vault must always be opened
/// with the profile it was sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// CPU/memory cost as a power of two (default: 15, N = 32 768).
    pub log_n: u8,
    /// Block size (default: 8).
    pub r: u32,
    /// Parallelism (default: 1).
    pub p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl KdfParams {
    /// The cheapest profile `derive_key` accepts. Only for tests.
    pub fn minimal() -> Self {
        Self {
            log_n: MIN_LOG_N,
            r: 8,
            p: 1,
        }
    }
}

/// A derived 32-byte key that is wiped when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Derive a 32-byte key from a passphrase and salt.
///
/// The same passphrase + salt + params always produce the same key.
/// Rejects an empty passphrase before doing any work.
pub fn derive_key(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(HbctlError::EmptyPassphrase);
    }
    if params.log_n < MIN_LOG_N {
        return Err(HbctlError::KeyDerivationFailed(format!(
            "scrypt log_n must be at least {MIN_LOG_N} (got {})",
            params.log_n
        )));
    }

    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| HbctlError::KeyDerivationFailed(format!("invalid scrypt params: {e}")))?;

    let mut key = DerivedKey([0u8; KEY_LEN]);
    scrypt::scrypt(passphrase, salt, &scrypt_params, &mut key.0)
        .map_err(|e| HbctlError::KeyDerivationFailed(format!("scrypt failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc7914_vector() {
        // RFC 7914 section 12, N=1024 r=8 p=16, first 32 bytes of the output.
        let params = KdfParams {
            log_n: 10,
            r: 8,
            p: 16,
        };
        let key = derive_key(b"password", b"NaCl", &params).unwrap();
        let expected: [u8; KEY_LEN] = [
            0xfd, 0xba, 0xbe, 0x1c, 0x9d, 0x34, 0x72, 0x00, 0x78, 0x56, 0xe7, 0x19, 0x0d, 0x01,
            0xe9, 0xfe, 0x7c, 0x6a, 0xd7, 0xcb, 0xc8, 0x23, 0x78, 0x30, 0xe7, 0x73, 0x76, 0x63,
            0x4b, 0x37, 0x31, 0x62,
        ];
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn default_profile_is_n15_r8_p1() {
        assert_eq!(
            KdfParams::default(),
            KdfParams {
                log_n: 15,
                r: 8,
                p: 1
            }
        );
    }

    #[test]
    fn same_inputs_same_key() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key(b"passphrase", &salt, &KdfParams::minimal()).unwrap();
        let b = derive_key(b"passphrase", &salt, &KdfParams::minimal()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salt_different_key() {
        let a = derive_key(b"passphrase", &[1u8; SALT_LEN], &KdfParams::minimal()).unwrap();
        let b = derive_key(b"passphrase", &[2u8; SALT_LEN], &KdfParams::minimal()).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_passphrase_rejected() {
        let result = derive_key(b"", &generate_salt(), &KdfParams::minimal());
        assert!(matches!(result, Err(HbctlError::EmptyPassphrase)));
    }

    #[test]
    fn weak_cost_rejected() {
        let params = KdfParams {
            log_n: 4,
            ..KdfParams::minimal()
        };
        let result = derive_key(b"pw", &generate_salt(), &params);
        assert!(matches!(result, Err(HbctlError::KeyDerivationFailed(_))));
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
