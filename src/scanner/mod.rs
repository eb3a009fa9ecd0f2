//! Pattern discovery for cold builds.
//!
//! The [`PatternScanner`] walks the patterns root and keeps files whose
//! root-relative path matches at least one include glob and no exclude glob.
//! The same matcher filters live watch events, so a cold build and an
//! incremental session agree on what counts as a pattern.

use crate::utils::to_manifest_path;
use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// `*` stops at `/`; `**` crosses directories
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Finds pattern templates under a root directory
#[derive(Debug, Clone)]
pub struct PatternScanner {
    /// Directory to walk
    root: PathBuf,
    /// A path must match one of these
    include: Vec<Pattern>,
    /// A path must match none of these
    exclude: Vec<Pattern>,
}

impl PatternScanner {
    /// Create a scanner from glob strings
    ///
    /// # Errors
    ///
    /// Returns an error if any glob is invalid
    pub fn new(root: PathBuf, include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            root,
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Directory being scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a normalized root-relative path counts as a pattern
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        self.include
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }

    /// Root-relative manifest path for `path`, if it is a pattern
    #[must_use]
    pub fn pattern_path(&self, path: &Path) -> Option<String> {
        to_manifest_path(&self.root, &path.to_string_lossy()).filter(|rel| self.matches(rel))
    }

    /// Walk the root and return every matching file, sorted
    ///
    /// A missing root yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if directory traversal fails
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            warn!(root = %self.root.display(), "Patterns root does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.with_context(|| {
                format!("Failed to read directory entry in {}", self.root.display())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            if self.pattern_path(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!(root = %self.root.display(), count = files.len(), "Pattern scan finished");
        Ok(files)
    }
}

/// Compile glob strings
fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid glob pattern: '{p}'")))
        .collect()
}
