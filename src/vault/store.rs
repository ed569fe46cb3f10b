//! High-level vault operations used by `login` and `start`.
//!
//! `Vault` wraps the binary format layer and the passphrase source so the
//! rest of the application can call `vault.save(record)` and
//! `vault.load::<MongoSecret>()`.

use std::fs;
use std::path::{Path, PathBuf};

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::format::{self, HEADER_LEN};
use super::records::{Record, Store};
use crate::crypto::KdfParams;
use crate::errors::{HbctlError, Result};
use crate::secure_fs;

/// Environment variable that supplies the passphrase non-interactively.
pub const PASSPHRASE_ENV: &str = "HBCTL_PASSPHRASE";

/// Where the vault passphrase comes from.
pub enum PassphraseSource {
    /// A value supplied out of band (environment, tests). Never confirmed.
    Override(Zeroizing<String>),
    /// Prompt on the terminal with echo suppressed.
    Interactive,
}

impl PassphraseSource {
    /// Use `HBCTL_PASSPHRASE` when set and non-empty, else prompt.
    pub fn from_env() -> Self {
        match std::env::var(PASSPHRASE_ENV) {
            Ok(pw) if !pw.is_empty() => Self::Override(Zeroizing::new(pw)),
            _ => Self::Interactive,
        }
    }

    pub fn fixed(passphrase: impl Into<String>) -> Self {
        Self::Override(Zeroizing::new(passphrase.into()))
    }

    /// Produce the passphrase, asking twice when `confirm` is set and the
    /// source is interactive.
    fn resolve(&self, confirm: bool) -> Result<Zeroizing<String>> {
        let passphrase = match self {
            Self::Override(pw) => pw.clone(),
            Self::Interactive => prompt("Enter hbctl passphrase")?,
        };

        if passphrase.is_empty() {
            return Err(HbctlError::EmptyPassphrase);
        }

        if confirm && matches!(self, Self::Interactive) {
            let again = prompt("Confirm hbctl passphrase")?;
            if !bool::from(passphrase.as_bytes().ct_eq(again.as_bytes())) {
                return Err(HbctlError::PassphraseMismatch);
            }
        }

        Ok(passphrase)
    }
}

fn prompt(label: &str) -> Result<Zeroizing<String>> {
    dialoguer::Password::new()
        .with_prompt(label)
        .allow_empty_password(true)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| HbctlError::CommandFailed(format!("passphrase prompt: {e}")))
}

/// Handle to the encrypted vault file.
pub struct Vault {
    path: PathBuf,
    passphrase: PassphraseSource,
    kdf: KdfParams,
}

impl Vault {
    pub fn new(path: impl Into<PathBuf>, passphrase: PassphraseSource) -> Self {
        Self {
            path: path.into(),
            passphrase,
            kdf: KdfParams::default(),
        }
    }

    /// Override the scrypt profile. A vault must be read with the same
    /// profile it was written with.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Merge `record` into the vault and re-encrypt it.
    ///
    /// Creating the vault asks for the passphrase twice.  An existing vault
    /// must decrypt with the supplied passphrase; otherwise nothing is written.
    pub fn save<R: Record>(&self, record: R) -> Result<()> {
        record.validate()?;

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            secure_fs::create_private_dir(dir)?;
        }

        let creating = !self.exists();
        let passphrase = self.passphrase.resolve(creating)?;

        let mut store = if creating {
            tracing::debug!(path = %self.path.display(), "creating new vault");
            Store::default()
        } else {
            let data = fs::read(&self.path)?;
            format::open_store(&data, passphrase.as_bytes(), &self.kdf)?
        };

        record.put(&mut store);

        let sealed = format::seal_store(&store, passphrase.as_bytes(), &self.kdf)?;
        secure_fs::write_atomic(&self.path, &sealed, secure_fs::PRIVATE_FILE_MODE)?;

        tracing::debug!(kind = %R::KIND, "record saved to vault");
        Ok(())
    }

    /// Decrypt the vault and return the `R` record.
    pub fn load<R: Record>(&self) -> Result<R> {
        self.load_store()?.get::<R>()
    }

    /// Decrypt the whole store with a single passphrase entry.
    pub fn load_store(&self) -> Result<Store> {
        if !self.exists() {
            return Err(HbctlError::VaultNotFound(self.path.clone()));
        }

        let data = fs::read(&self.path)?;
        if data.len() < HEADER_LEN {
            return Err(HbctlError::CorruptVault(format!(
                "{} is truncated ({} bytes)",
                self.path.display(),
                data.len()
            )));
        }

        let passphrase = self.passphrase.resolve(false)?;
        format::open_store(&data, passphrase.as_bytes(), &self.kdf)
    }
}
