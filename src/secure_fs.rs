//! Owner-only file helpers shared by the vault and the runtime secret dir.
//!
//! Every write goes to a temp file in the target directory first and is then
//! renamed over the target, so readers never see a half-written file and an
//! existing read-only target can still be replaced.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::errors::{HbctlError, Result};

/// Mode for directories holding secrets.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Mode for the vault file.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Mode for runtime secrets handed to services.
pub const READ_ONLY_FILE_MODE: u32 = 0o400;

/// Create `dir` and any missing parents as owner-only directories.
///
/// Directories that already exist keep their permissions.
pub fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let missing: Vec<&Path> = dir
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .collect();

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(PRIVATE_DIR_MODE);
    }
    builder.create(dir)?;

    // The umask may have masked bits off the requested mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for created in missing {
            fs::set_permissions(created, fs::Permissions::from_mode(PRIVATE_DIR_MODE))?;
        }
    }
    #[cfg(not(unix))]
    let _ = missing;

    Ok(())
}

/// Write `contents` to `path` atomically with the given Unix `mode`.
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    let wrap = |source: std::io::Error| HbctlError::SecretFile {
        path: path.to_path_buf(),
        source,
    };

    // A temp file left behind by a crash may itself be read-only.
    match fs::remove_file(&tmp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(wrap(e)),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_FILE_MODE);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(&tmp_path).map_err(wrap)?;
    file.write_all(contents).map_err(wrap)?;
    file.sync_all().map_err(wrap)?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(mode)).map_err(wrap)?;
    }

    fs::rename(&tmp_path, path).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_replaces_read_only_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("admin_token");

        write_atomic(&path, b"first", READ_ONLY_FILE_MODE).unwrap();
        write_atomic(&path, b"second", READ_ONLY_FILE_MODE).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join(".admin_token.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jwt_secret");
        write_atomic(&path, b"s3cret", READ_ONLY_FILE_MODE).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o400);
    }

    #[cfg(unix)]
    #[test]
    fn private_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("runtime");
        create_private_dir(&nested).unwrap();

        let mode = fs::metadata(&nested).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
        let parent = fs::metadata(dir.path().join("a")).unwrap().permissions().mode() & 0o777;
        assert_eq!(parent, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn existing_dir_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let shared = dir.path().join("shared");
        fs::create_dir(&shared).unwrap();
        fs::set_permissions(&shared, fs::Permissions::from_mode(0o755)).unwrap();

        create_private_dir(&shared).unwrap();
        create_private_dir(&shared.join("runtime")).unwrap();

        let mode = fs::metadata(&shared).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        let child = fs::metadata(shared.join("runtime")).unwrap().permissions().mode() & 0o777;
        assert_eq!(child, 0o700);
    }
}
