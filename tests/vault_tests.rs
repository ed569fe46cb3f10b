//! Integration tests for the hbctl vault.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use hbctl::crypto::KdfParams;
use hbctl::errors::HbctlError;
use hbctl::vault::{
    MongoSecret, PassphraseSource, RecordKind, ServiceKeyPair, SigningSecret, Vault,
};
use tempfile::TempDir;

/// Helper: a vault path inside a fresh temp dir.
fn vault_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join(".hbctl").join("secrets.enc");
    (dir, path)
}

fn vault(path: &PathBuf, passphrase: &str) -> Vault {
    Vault::new(path.clone(), PassphraseSource::fixed(passphrase))
        .with_kdf_params(KdfParams::minimal())
}

fn mongo() -> MongoSecret {
    MongoSecret {
        user: "herringbone".into(),
        password: "s3cr3t!".into(),
        database: "herringbone".into(),
        collection: Some("logs".into()),
        host: "mongodb".into(),
        port: 27017,
        auth_source: "admin".into(),
        replica_set: Some("rs0".into()),
    }
}

fn keypair() -> &'static ServiceKeyPair {
    static KEYS: OnceLock<ServiceKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| ServiceKeyPair::generate(2048).expect("generate keypair"))
}

// ---------------------------------------------------------------------------
// Round-trips
// ---------------------------------------------------------------------------

#[test]
fn mongo_secret_roundtrip() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(mongo()).unwrap();

    let loaded: MongoSecret = vault(&path, "pw").load().unwrap();
    assert_eq!(loaded, mongo());
}

#[test]
fn signing_secret_roundtrip() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(SigningSecret::new("hmac-key")).unwrap();

    let loaded: SigningSecret = vault(&path, "pw").load().unwrap();
    assert_eq!(loaded.secret, "hmac-key");
}

#[test]
fn service_keypair_roundtrip() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(keypair().clone()).unwrap();

    let loaded: ServiceKeyPair = vault(&path, "pw").load().unwrap();
    assert_eq!(&loaded, keypair());
}

#[test]
fn saving_one_kind_keeps_the_others() {
    let (_dir, path) = vault_path();
    let v = vault(&path, "pw");
    v.save(mongo()).unwrap();
    v.save(SigningSecret::new("first")).unwrap();
    v.save(SigningSecret::new("second")).unwrap();

    let store = v.load_store().unwrap();
    assert_eq!(store.mongodb, Some(mongo()));
    assert_eq!(store.jwt.map(|j| j.secret).as_deref(), Some("second"));
    assert!(store.service_key.is_none());
}

/// A vault sealed outside hbctl with scrypt N=2^15, r=8, p=1 and
/// AES-256-GCM over `salt || nonce || body`, passphrase "correct horse".
const SCRYPT_N15_VAULT: &[u8] = include_bytes!("fixtures/scrypt_n15_vault.enc");

#[test]
fn reads_vault_sealed_with_default_scrypt_profile() {
    let (_dir, path) = vault_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, SCRYPT_N15_VAULT).unwrap();

    // Default KDF profile, no test override.
    let v = Vault::new(&path, PassphraseSource::fixed("correct horse"));
    let store = v.load_store().unwrap();

    assert_eq!(store.jwt.map(|j| j.secret).as_deref(), Some("abc"));
    let mongo = store.mongodb.unwrap();
    assert_eq!(mongo.user, "herringbone");
    assert_eq!(mongo.password, "s3cr3t!");
    assert_eq!(mongo.port, 27017);
    assert_eq!(mongo.auth_source, "admin");
    assert!(mongo.collection.is_none());
    assert!(store.service_key.is_none());

    let wrong = Vault::new(&path, PassphraseSource::fixed("wrong horse"))
        .load::<SigningSecret>()
        .unwrap_err();
    assert!(matches!(wrong, HbctlError::WrongPassphrase));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn wrong_passphrase_differs_from_missing_file() {
    let (_dir, path) = vault_path();

    let missing = vault(&path, "pw").load::<MongoSecret>().unwrap_err();
    assert!(matches!(missing, HbctlError::VaultNotFound(_)));

    vault(&path, "pw").save(mongo()).unwrap();
    let wrong = vault(&path, "not-pw").load::<MongoSecret>().unwrap_err();
    assert!(matches!(wrong, HbctlError::WrongPassphrase));
}

#[test]
fn save_with_wrong_passphrase_leaves_vault_untouched() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(mongo()).unwrap();
    let before = fs::read(&path).unwrap();

    let err = vault(&path, "other")
        .save(SigningSecret::new("x"))
        .unwrap_err();
    assert!(matches!(err, HbctlError::WrongPassphrase));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn missing_record_is_reported_by_kind() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(mongo()).unwrap();

    let err = vault(&path, "pw").load::<ServiceKeyPair>().unwrap_err();
    assert!(matches!(
        err,
        HbctlError::RecordNotStored(RecordKind::ServiceKeyPair)
    ));
}

#[test]
fn truncated_vault_is_corrupt() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(mongo()).unwrap();

    let data = fs::read(&path).unwrap();
    fs::write(&path, &data[..27]).unwrap();

    let err = vault(&path, "pw").load::<MongoSecret>().unwrap_err();
    assert!(matches!(err, HbctlError::CorruptVault(_)));
}

#[test]
fn tampered_ciphertext_fails_authentication() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(mongo()).unwrap();

    let mut data = fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0x01;
    fs::write(&path, &data).unwrap();

    let err = vault(&path, "pw").load::<MongoSecret>().unwrap_err();
    assert!(matches!(err, HbctlError::WrongPassphrase));
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[test]
fn every_save_uses_fresh_salt_and_nonce() {
    let (_dir, path) = vault_path();
    let v = vault(&path, "pw");

    v.save(SigningSecret::new("same")).unwrap();
    let first = fs::read(&path).unwrap();
    v.save(SigningSecret::new("same")).unwrap();
    let second = fs::read(&path).unwrap();

    // salt(16) || nonce(12)
    assert_ne!(first[..16], second[..16]);
    assert_ne!(first[16..28], second[16..28]);
}

#[test]
fn file_holds_header_ciphertext_and_tag() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(SigningSecret::new("k")).unwrap();

    let data = fs::read(&path).unwrap();
    let plaintext_len = r#"{"jwt":{"jwt_secret":"k"}}"#.len();
    // Pretty-printed JSON is at least as long as the compact form; tag is 16.
    assert!(data.len() >= 28 + plaintext_len + 16);
    assert!(!String::from_utf8_lossy(&data).contains("jwt_secret"));
}

#[test]
fn no_temp_file_left_behind() {
    let (_dir, path) = vault_path();
    vault(&path, "pw").save(mongo()).unwrap();

    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
