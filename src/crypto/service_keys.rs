//! RSA keypairs used by the credential-issuing service to sign and verify
//! service-scoped tokens.
//!
//! Private keys are PKCS#1 PEM (`RSA PRIVATE KEY`), public keys are
//! X.509 SubjectPublicKeyInfo PEM (`PUBLIC KEY`).

use aes_gcm::aead::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::errors::{HbctlError, Result};

/// Smallest modulus accepted for generation.
pub const MIN_RSA_BITS: usize = 2048;

/// Default modulus size when the operator does not pick one.
pub const DEFAULT_RSA_BITS: usize = 4096;

/// A freshly generated keypair, PEM-encoded.
pub struct GeneratedKeyPair {
    pub public_pem: String,
    pub private_pem: Zeroizing<String>,
}

/// Generate an RSA keypair of `bits` bits.
///
/// Fails with [`HbctlError::KeySizeTooSmall`] below 2048 bits, before any
/// key material is produced.
pub fn generate_keypair(bits: usize) -> Result<GeneratedKeyPair> {
    if bits < MIN_RSA_BITS {
        return Err(HbctlError::KeySizeTooSmall {
            bits,
            min: MIN_RSA_BITS,
        });
    }

    tracing::debug!(bits, "generating RSA service keypair");
    let key = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| HbctlError::KeyGenerationFailed(e.to_string()))?;

    let private_pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| HbctlError::KeyGenerationFailed(format!("PKCS#1 encoding: {e}")))?;
    let public_pem = key
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| HbctlError::KeyGenerationFailed(format!("PKIX encoding: {e}")))?;

    Ok(GeneratedKeyPair {
        public_pem,
        private_pem,
    })
}

/// Check that `pem` is a PKCS#1 RSA private key.
pub fn validate_private_key(pem: &str) -> Result<()> {
    RsaPrivateKey::from_pkcs1_pem(pem.trim())
        .map(|_| ())
        .map_err(|e| HbctlError::InvalidPem(format!("not a PKCS#1 RSA private key: {e}")))
}

/// Check that `pem` is a PKIX RSA public key.
pub fn validate_public_key(pem: &str) -> Result<()> {
    RsaPublicKey::from_public_key_pem(pem.trim())
        .map(|_| ())
        .map_err(|e| HbctlError::InvalidPem(format!("not a PKIX RSA public key: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_small_modulus() {
        let err = generate_keypair(1024).err().unwrap();
        assert!(matches!(
            err,
            HbctlError::KeySizeTooSmall {
                bits: 1024,
                min: 2048
            }
        ));
    }

    #[test]
    fn validators_reject_garbage() {
        assert!(validate_private_key("not a pem").is_err());
        assert!(validate_public_key("").is_err());
    }

    #[test]
    fn validators_reject_wrong_block_type() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert!(matches!(
            validate_private_key(pem),
            Err(HbctlError::InvalidPem(_))
        ));
        assert!(matches!(
            validate_public_key(pem),
            Err(HbctlError::InvalidPem(_))
        ));
    }
}
