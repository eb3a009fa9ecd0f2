//! File-system access used by the manifest store.
//!
//! The store never touches `std::fs` directly. It is handed a [`FileSystem`]
//! at construction so tests can inject failures and alternative backends.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// What a path on disk currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Anything else (socket, fifo, device)
    Other,
}

/// Minimal file-system surface the manifest store depends on
pub trait FileSystem {
    /// Read a whole file as UTF-8
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, including `NotFound`
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace the file at `path` with `contents` in a single step
    ///
    /// Readers observe either the previous file or the new one, never a
    /// partial write.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Stat a path; `Ok(None)` when it does not exist
    ///
    /// Symlinks are followed.
    ///
    /// # Errors
    ///
    /// Returns I/O errors other than `NotFound`
    fn kind(&self, path: &Path) -> io::Result<Option<PathKind>>;
}

/// [`FileSystem`] backed by the real disk
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // Temp file in the target directory so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn kind(&self, path: &Path) -> io::Result<Option<PathKind>> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Some(PathKind::Directory)),
            Ok(meta) if meta.is_file() => Ok(Some(PathKind::File)),
            Ok(_) => Ok(Some(PathKind::Other)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_write_atomic_creates_and_replaces() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("nested/patterns.json");

        StdFileSystem.write_atomic(&target, b"first")?;
        assert_eq!(StdFileSystem.read_to_string(&target)?, "first");

        StdFileSystem.write_atomic(&target, b"second")?;
        assert_eq!(StdFileSystem.read_to_string(&target)?, "second");

        // No temp files left behind
        let leftovers = std::fs::read_dir(dir.path().join("nested"))?.count();
        assert_eq!(leftovers, 1);
        Ok(())
    }

    #[test]
    fn test_kind() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("button.hbs");
        std::fs::write(&file, "<button/>")?;

        assert_eq!(StdFileSystem.kind(dir.path())?, Some(PathKind::Directory));
        assert_eq!(StdFileSystem.kind(&file)?, Some(PathKind::File));
        assert_eq!(StdFileSystem.kind(&dir.path().join("gone.hbs"))?, None);
        Ok(())
    }
}
