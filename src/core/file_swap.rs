//! Scoped replacement of a file's content.
//!
//! A [`FileSwap`] snapshots the file when it is opened. Writes go through
//! an atomic temp-file-then-rename, and the snapshot is put back when the
//! guard is dropped unless the swap was committed. With `always_revert`
//! the snapshot is restored even after a commit, which gives a temporary
//! edit that lasts exactly as long as the guard.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::io;

pub struct FileSwap {
    path: PathBuf,
    /// `None` when the file did not exist before the swap.
    original: Option<String>,
    always_revert: bool,
    written: bool,
    committed: bool,
}

impl FileSwap {
    pub fn open(path: impl Into<PathBuf>, always_revert: bool) -> Result<Self> {
        let path = path.into();
        let original = io::read_file_optional(&path, "snapshot file")?;
        Ok(Self {
            path,
            original,
            always_revert,
            written: false,
            committed: false,
        })
    }

    pub fn write(&mut self, content: &str) -> Result<()> {
        self.written = true;
        io::write_file_atomic(&self.path, content, "swap file")
    }

    /// Keep the new content. With `always_revert` set, the original comes
    /// back right away instead.
    pub fn commit(mut self) -> Result<()> {
        self.committed = true;
        if self.always_revert {
            self.restore()?;
        }
        Ok(())
    }

    /// Put the snapshot back now and surface any error.
    pub fn revert(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if !self.written {
            return Ok(());
        }
        self.written = false;
        match &self.original {
            Some(content) => io::write_file_atomic(&self.path, content, "restore file"),
            None => io::remove_file_if_exists(&self.path, "restore file"),
        }
    }
}

impl Drop for FileSwap {
    fn drop(&mut self) {
        if self.committed && !self.always_revert {
            return;
        }
        if let Err(err) = self.restore() {
            log_status!(
                "swap",
                "Failed to restore {}: {}",
                self.path.display(),
                err.details
            );
        }
    }
}

/// Swap `content` into `path`, run `operation`, then restore the file on
/// every exit path, including when `operation` fails or panics.
pub fn with_temporary_content<T>(
    path: &Path,
    content: &str,
    operation: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let mut swap = FileSwap::open(path, true)?;
    swap.write(content)?;
    let result = operation();
    let restored = swap.revert();
    let value = result?;
    restored?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn committed_swap_keeps_new_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        let mut swap = FileSwap::open(&path, false).unwrap();
        swap.write("new").unwrap();
        swap.commit().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn dropped_swap_restores_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        {
            let mut swap = FileSwap::open(&path, false).unwrap();
            swap.write("new").unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn always_revert_restores_even_after_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        let mut swap = FileSwap::open(&path, true).unwrap();
        swap.write("new").unwrap();
        swap.commit().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn restore_removes_file_that_did_not_exist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        let mut swap = FileSwap::open(&path, true).unwrap();
        swap.write("created").unwrap();
        swap.revert().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn temporary_content_visible_during_operation_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        let seen = with_temporary_content(&path, "new", || {
            Ok(fs::read_to_string(&path).unwrap())
        })
        .unwrap();

        assert_eq!(seen, "new");
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn temporary_content_restored_when_operation_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        let result: Result<()> = with_temporary_content(&path, "new", || {
            Err(Error::internal_unexpected("publish failed"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn temporary_content_restored_when_operation_panics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "old").unwrap();

        let caught = std::panic::catch_unwind(|| {
            let _ = with_temporary_content(&path, "new", || -> Result<()> { panic!("boom") });
        });

        assert!(caught.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }
}
