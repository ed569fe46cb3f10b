use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::service_keys::DEFAULT_RSA_BITS;
use crate::errors::{HbctlError, Result};

/// Operator configuration, loaded from `~/.hbctl/config.toml`.
///
/// Every field has a sensible default so hbctl works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Compose project name (`docker compose -p`).
    #[serde(default = "default_project")]
    pub project: String,

    /// Directory holding the `compose.*.yml` files.
    #[serde(default = "default_compose_dir")]
    pub compose_dir: PathBuf,

    /// Where runtime secrets are written (default: `<compose_dir>/secrets/runtime`).
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,

    /// Base URL of the credential-issuing service.
    #[serde(default = "default_issuer_url")]
    pub issuer_url: String,

    /// Host the database is reachable on from this machine.
    #[serde(default = "default_database_host")]
    pub database_host: String,

    /// How long to wait for the issuer health endpoint (default: 45s).
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,

    /// Pause between health probes (default: 500ms).
    #[serde(default = "default_health_interval_ms")]
    pub health_interval_ms: u64,

    /// How long the fallback docs probe may take (default: 5s).
    #[serde(default = "default_docs_timeout_secs")]
    pub docs_timeout_secs: u64,

    /// How long to wait for database root auth (default: 60s).
    #[serde(default = "default_database_timeout_secs")]
    pub database_timeout_secs: u64,

    /// Pause between database connection attempts (default: 2s).
    #[serde(default = "default_database_interval_secs")]
    pub database_interval_secs: u64,

    /// Timeout for each issuer API request (default: 10s).
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Receiver transport used when the whole stack is started.
    #[serde(default = "default_receiver_type")]
    pub default_receiver_type: String,

    /// RSA modulus size for `login servicekey --generate` (default: 4096).
    #[serde(default = "default_rsa_bits")]
    pub rsa_bits: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_project() -> String {
    "herringbone".to_string()
}

fn default_compose_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_issuer_url() -> String {
    "http://localhost:7001".to_string()
}

fn default_database_host() -> String {
    "localhost".to_string()
}

fn default_health_timeout_secs() -> u64 {
    45
}

fn default_health_interval_ms() -> u64 {
    500
}

fn default_docs_timeout_secs() -> u64 {
    5
}

fn default_database_timeout_secs() -> u64 {
    60
}

fn default_database_interval_secs() -> u64 {
    2
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_receiver_type() -> String {
    "UDP".to_string()
}

fn default_rsa_bits() -> usize {
    DEFAULT_RSA_BITS
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            project: default_project(),
            compose_dir: default_compose_dir(),
            runtime_dir: None,
            issuer_url: default_issuer_url(),
            database_host: default_database_host(),
            health_timeout_secs: default_health_timeout_secs(),
            health_interval_ms: default_health_interval_ms(),
            docs_timeout_secs: default_docs_timeout_secs(),
            database_timeout_secs: default_database_timeout_secs(),
            database_interval_secs: default_database_interval_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            default_receiver_type: default_receiver_type(),
            rsa_bits: default_rsa_bits(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the hbctl home directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<hbctl_dir>/config.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(hbctl_dir: &Path) -> Result<Self> {
        let config_path = hbctl_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        toml::from_str(&contents).map_err(|e| {
            HbctlError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// Directory runtime secrets are written to.
    pub fn runtime_dir(&self) -> PathBuf {
        self.runtime_dir
            .clone()
            .unwrap_or_else(|| self.compose_dir.join("secrets").join("runtime"))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn docs_timeout(&self) -> Duration {
        Duration::from_secs(self.docs_timeout_secs)
    }

    pub fn database_timeout(&self) -> Duration {
        Duration::from_secs(self.database_timeout_secs)
    }

    pub fn database_interval(&self) -> Duration {
        Duration::from_secs(self.database_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
