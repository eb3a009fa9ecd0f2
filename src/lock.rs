//! Writer lock for the manifest file
//!
//! Only one patman process may write a given manifest at a time. The lock is
//! an advisory exclusive lock on `<manifest>.lock`, so the operating system
//! releases it if the holder crashes. Dropping [`ManifestLock`] releases it.
//!
//! The lock file is never removed. Unlinking it while a waiter holds an open
//! handle would let a third process lock a fresh file at the same path, and
//! both would believe they are the sole writer.

use anyhow::{Context, Result, bail};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

/// Exclusive claim on a manifest file
#[derive(Debug)]
pub struct ManifestLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages)
    lock_path: PathBuf,
}

impl ManifestLock {
    /// Acquire the writer lock for `manifest_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lock file cannot be created
    /// - Another process still holds the lock after the retry window
    pub fn acquire(manifest_path: &Path) -> Result<Self> {
        let lock_path = Self::lock_path_for(manifest_path);
        crate::utils::ensure_parent_dirs(&lock_path)?;

        let lock_timeout = if cfg!(test) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(5)
        };
        let retry_interval = if cfg!(test) {
            Duration::from_millis(10)
        } else {
            Duration::from_millis(100)
        };

        let start = Instant::now();

        loop {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) => {
                    // Owner info is informational; the lock itself is what matters
                    if let Err(e) = file.set_len(0).and_then(|()| {
                        writeln!(
                            file,
                            "pid={}\ntime={}",
                            std::process::id(),
                            humantime::format_rfc3339(SystemTime::now())
                        )
                    }) {
                        debug!(lock = %lock_path.display(), error = %e, "Failed to record lock owner");
                    }
                    debug!(lock = %lock_path.display(), "Manifest lock acquired");
                    return Ok(Self {
                        lock_file: file,
                        lock_path,
                    });
                }
                Ok(false) | Err(_) if start.elapsed() < lock_timeout => {
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    bail!(
                        "Another patman process is writing this manifest (lock: {}). \
                         Wait for it to finish and try again",
                        lock_path.display()
                    );
                }
            }
        }
    }

    /// Lock file used for a manifest path
    #[must_use]
    pub fn lock_path_for(manifest_path: &Path) -> PathBuf {
        let mut name = manifest_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".lock");
        manifest_path.with_file_name(name)
    }

    /// Path of the held lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            debug!(lock = %self.lock_path.display(), error = %e, "Failed to unlock manifest");
        }
    }
}
