use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Converts backslashes to forward slashes and collapses repeated slashes
///
/// The result is the platform-independent form used for every `filepath`
/// written to the manifest.
#[must_use]
pub fn normalize_slashes(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut previous_was_slash = false;

    for ch in raw.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        normalized.push(ch);
    }

    normalized
}

/// Turns an event or scan path into a manifest `filepath`
///
/// Paths under `root` are made relative to it. Relative paths are taken as
/// already relative to the root. `.` segments are dropped and `..` pops the
/// previous segment. Returns `None` for an absolute path outside the root, a
/// `..` that climbs above the root, or a path that normalizes to nothing.
#[must_use]
pub fn to_manifest_path(root: &Path, raw: &str) -> Option<String> {
    let path = Path::new(raw);
    let relative = match path.strip_prefix(root) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) if path.is_absolute() => return None,
        Err(_) => raw.to_string(),
    };

    let normalized = normalize_slashes(&relative);
    let mut segments: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name),
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Ensures parent directories exist for a given path
///
/// # Errors
///
/// Returns an error if the parent directories cannot be created
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create parent directories for {}", path.display())
        })?;
    }
    Ok(())
}

/// Makes a path absolute, resolving relative paths from current directory
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined
pub fn make_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir().context("Failed to read current directory")?;
        Ok(current_dir.join(path))
    }
}

/// Resolves `path` against `base` unless it is already absolute
#[must_use]
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
