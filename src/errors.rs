use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::orchestrator::Step;
use crate::vault::RecordKind;

/// All errors that can occur in hbctl.
#[derive(Debug, Error)]
pub enum HbctlError {
    // --- Configuration errors ---
    #[error("Empty passphrase not allowed")]
    EmptyPassphrase,

    #[error("Passphrases do not match")]
    PassphraseMismatch,

    #[error("RSA key size must be >= {min} bits (got {bits})")]
    KeySizeTooSmall { bits: usize, min: usize },

    #[error("Invalid PEM data: {0}")]
    InvalidPem(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("--type is required for the receiver element")]
    MissingReceiverType,

    #[error("Specify --element, --unit, or --all")]
    NoStartTarget,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault file is corrupt: {0}")]
    CorruptVault(String),

    #[error("Failed to decrypt secrets (wrong passphrase?)")]
    WrongPassphrase,

    #[error("No {0} stored in the vault")]
    RecordNotStored(RecordKind),

    // --- Readiness errors ---
    #[error("Timed out after {}s waiting for {target}", .waited.as_secs())]
    Timeout { target: String, waited: Duration },

    // --- Remote errors ---
    #[error("{url} rejected the request: http {status}: {body}")]
    RemoteRejected {
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("`{command}` failed{}", .code.map(|c| format!(" with exit code {c}")).unwrap_or_default())]
    ProcessFailed { command: String, code: Option<i32> },

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed writing {}: {source}", .path.display())]
    SecretFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Orchestration errors ---
    #[error("{step} failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: Box<HbctlError>,
    },

    #[error("Bootstrap of service '{service}' failed: {source}")]
    ServiceBootstrap {
        service: String,
        #[source]
        source: Box<HbctlError>,
    },

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl HbctlError {
    /// Walk through orchestration wrappers to the error that caused them.
    pub fn root_cause(&self) -> &HbctlError {
        match self {
            Self::StepFailed { source, .. } | Self::ServiceBootstrap { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// Convenience type alias for hbctl results.
pub type Result<T> = std::result::Result<T, HbctlError>;
