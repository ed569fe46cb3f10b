//! Operator configuration and well-known paths.

pub mod settings;

use std::path::PathBuf;

use crate::errors::{HbctlError, Result};

pub use settings::Settings;

/// Name of the vault file inside the hbctl home directory.
pub const VAULT_FILE_NAME: &str = "secrets.enc";

/// The per-operator hbctl directory: `~/.hbctl`.
pub fn hbctl_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".hbctl"))
        .ok_or_else(|| HbctlError::ConfigError("cannot determine home directory".into()))
}

/// Path of the operator's vault file: `~/.hbctl/secrets.enc`.
pub fn vault_path() -> Result<PathBuf> {
    Ok(hbctl_dir()?.join(VAULT_FILE_NAME))
}
