//! Runtime secret files read by the started services.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{HbctlError, Result};
use crate::secure_fs;

pub const JWT_SECRET_FILE: &str = "jwt_secret";
pub const SERVICE_PRIVATE_KEY_FILE: &str = "service_jwt_private_key";
pub const SERVICE_PUBLIC_KEY_FILE: &str = "service_jwt_public_key";
pub const ADMIN_TOKEN_FILE: &str = "admin_token";

/// File name for a service's bootstrap token, e.g.
/// `parser-extractor` -> `parser_extractor_service_token`.
pub fn token_file_name(service: &str) -> String {
    let stem: String = service
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}_service_token")
}

/// The directory runtime secrets are written to.
#[derive(Debug, Clone)]
pub struct RuntimeDir {
    root: PathBuf,
}

impl RuntimeDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create the directory owner-only if needed.
    pub fn ensure(&self) -> Result<()> {
        secure_fs::create_private_dir(&self.root)
    }

    /// Write (or replace) `name` with owner-read-only permissions.
    pub fn write_secret(&self, name: &str, value: &str) -> Result<()> {
        self.ensure()?;
        secure_fs::write_atomic(
            &self.file(name),
            value.as_bytes(),
            secure_fs::READ_ONLY_FILE_MODE,
        )
    }

    /// Trimmed contents of `name`; `None` when missing or blank.
    pub fn read_trimmed(&self, name: &str) -> Result<Option<String>> {
        let path = self.file(name);
        match fs::read_to_string(&path) {
            Ok(s) => {
                let s = s.trim();
                Ok((!s.is_empty()).then(|| s.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HbctlError::SecretFile { path, source }),
        }
    }
}
