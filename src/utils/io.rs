//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read file contents, mapping failures to `internal.io_error` with the given operation.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        let message = if e.kind() == ErrorKind::NotFound {
            format!("File not found: {}", path.display())
        } else {
            format!("{}: {}", path.display(), e)
        };
        Error::internal_io(message, Some(operation.to_string()))
    })
}

/// Like [`read_file`], but a missing file is `Ok(None)` rather than an error.
pub fn read_file_optional(path: &Path, operation: &str) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::internal_io(
            format!("{}: {}", path.display(), e),
            Some(operation.to_string()),
        )),
    }
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// The rename is atomic on POSIX filesystems, so readers see either the
/// old content or the new content, never a partial write. A symlinked path
/// is written through to its target, and an existing file keeps its
/// permissions.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let target = resolve_symlink(path, operation)?;
    let filename = target.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = target.with_file_name(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    if let Ok(metadata) = fs::metadata(&target) {
        if let Err(e) = fs::set_permissions(&tmp_path, metadata.permissions()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::internal_io(
                e.to_string(),
                Some(format!("{} (permissions)", operation)),
            ));
        }
    }

    if let Err(e) = fs::rename(&tmp_path, &target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::internal_io(
            e.to_string(),
            Some(format!("{} (rename)", operation)),
        ));
    }

    Ok(())
}

fn resolve_symlink(path: &Path, operation: &str) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => fs::canonicalize(path).map_err(|e| {
            Error::internal_io(
                format!("{}: {}", path.display(), e),
                Some(format!("{} (resolve symlink)", operation)),
            )
        }),
        _ => Ok(path.to_path_buf()),
    }
}

/// Remove a file, treating an already-missing file as success.
pub fn remove_file_if_exists(path: &Path, operation: &str) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::internal_io(e.to_string(), Some(operation.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "[package]").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("[package]"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let err = read_file(Path::new("/nonexistent/Cargo.toml"), "test read").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn read_file_optional_maps_missing_to_none() {
        let dir = tempdir().unwrap();
        let result = read_file_optional(&dir.path().join("absent.json"), "test read").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn write_file_atomic_replaces_content_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new", "test write").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("Cargo.toml.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_file_atomic_writes_through_symlink_and_keeps_mode() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = tempdir().unwrap();
        let target = dir.path().join("real.toml");
        fs::write(&target, "old").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o600)).unwrap();
        let link = dir.path().join("Cargo.toml");
        symlink(&target, &link).unwrap();

        write_file_atomic(&link, "new", "test write").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::metadata(&target).unwrap().permissions().mode() & 0o777, 0o600);
        assert!(!dir.path().join("real.toml.tmp").exists());
    }

    #[test]
    fn write_file_atomic_fails_for_missing_directory() {
        let err = write_file_atomic(
            Path::new("/nonexistent/dir/Cargo.toml"),
            "content",
            "test write",
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn remove_file_if_exists_ignores_missing() {
        let dir = tempdir().unwrap();
        assert!(remove_file_if_exists(&dir.path().join("gone"), "test remove").is_ok());
    }
}
