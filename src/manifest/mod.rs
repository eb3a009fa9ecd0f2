//! Pattern manifest: the JSON document describing every pattern template.
//!
//! The manifest is the source of truth for "which patterns exist". It is
//! written by [`ManifestStore`] and read by the template compiler. On disk it
//! looks like:
//!
//! ```json
//! {
//!   "patterns": [
//!     { "title": "button", "description": "", "filename": "button", "filepath": "atoms/button.hbs" }
//!   ],
//!   "folder": [
//!     { "name": "atoms", "description": "..." }
//!   ]
//! }
//! ```
//!
//! # Architecture
//!
//! - [`PatternEntry`] / [`FolderDescriptor`] / [`Manifest`] - the data model
//! - [`PatternEvent`] - file-system events the store understands
//! - [`ManifestStore`] - owns the manifest and applies events to it
//!
//! Deleting a pattern never removes its entry; the entry is kept with
//! `deleted: true` so a later add or rename can bring it back.

pub mod event;
pub mod store;

pub use event::PatternEvent;
pub use store::{EventOutcome, ManifestStore, ScanReport};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One discovered pattern template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    /// Human-readable name, the filename with a leading underscore stripped
    pub title: String,
    /// Free text, never auto-populated
    #[serde(default)]
    pub description: String,
    /// Base filename without extension
    pub filename: String,
    /// Path relative to the patterns root, forward slashes only
    pub filepath: String,
    /// Tombstone marker; absent means live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl PatternEntry {
    /// Derive a fresh entry from a normalized manifest path
    #[must_use]
    pub fn from_manifest_path(filepath: &str) -> Self {
        let filename = filename_of(filepath);
        Self {
            title: title_of(&filename),
            description: String::new(),
            filename,
            filepath: filepath.to_string(),
            deleted: None,
        }
    }

    /// Whether this entry is a tombstone
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted == Some(true)
    }

    /// Point the entry at `filepath`, refresh derived names, clear the tombstone
    ///
    /// `description` is kept.
    pub fn relocate(&mut self, filepath: &str) {
        let filename = filename_of(filepath);
        self.title = title_of(&filename);
        self.filename = filename;
        self.filepath = filepath.to_string();
        self.deleted = None;
    }

    /// Mark the entry deleted
    pub fn mark_deleted(&mut self) {
        self.deleted = Some(true);
    }
}

/// Static description of a pattern category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDescriptor {
    /// Category directory name
    pub name: String,
    /// What belongs in the category
    pub description: String,
}

impl FolderDescriptor {
    /// Construct a descriptor
    #[must_use]
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Pattern categories compiled into the tool
#[must_use]
pub fn default_folders() -> Vec<FolderDescriptor> {
    vec![
        FolderDescriptor::new(
            "atoms",
            "Basic building blocks such as buttons, inputs and labels",
        ),
        FolderDescriptor::new(
            "molecules",
            "Small groups of atoms functioning together as a unit",
        ),
        FolderDescriptor::new(
            "organism",
            "Complex components composed of molecules and atoms",
        ),
        FolderDescriptor::new(
            "templates",
            "Page-level layouts placing organisms into a structure",
        ),
        FolderDescriptor::new(
            "pages",
            "Templates filled with representative content",
        ),
    ]
}

/// The full manifest document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Every known pattern, including tombstones
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
    /// Category metadata
    #[serde(default)]
    pub folder: Vec<FolderDescriptor>,
}

impl Manifest {
    /// Empty manifest carrying the compiled-in folder list
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            folder: default_folders(),
        }
    }

    /// Parse a manifest from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid manifest document
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse pattern manifest")
    }

    /// Serialize to pretty JSON with a trailing newline
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("Failed to serialize pattern manifest")?;
        json.push('\n');
        Ok(json)
    }

    /// Sort entries by `filepath`, byte-wise, keeping insertion order for ties
    pub fn sort(&mut self) {
        self.patterns
            .sort_by(|a, b| a.filepath.as_bytes().cmp(b.filepath.as_bytes()));
    }

    /// Index of the live entry at `filepath`
    #[must_use]
    pub fn find_live(&self, filepath: &str) -> Option<usize> {
        self.patterns
            .iter()
            .position(|e| e.filepath == filepath && !e.is_deleted())
    }

    /// Index of the entry at `filepath`, preferring a live one over a tombstone
    #[must_use]
    pub fn locate(&self, filepath: &str) -> Option<usize> {
        self.find_live(filepath)
            .or_else(|| self.patterns.iter().position(|e| e.filepath == filepath))
    }

    /// Entries that are not tombstones
    pub fn live(&self) -> impl Iterator<Item = &PatternEntry> {
        self.patterns.iter().filter(|e| !e.is_deleted())
    }

    /// Number of entries that are not tombstones
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live().count()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Last path segment with its final extension removed
fn filename_of(filepath: &str) -> String {
    let base = filepath.rsplit('/').next().unwrap_or(filepath);
    match base.rfind('.') {
        Some(dot) if dot > 0 => base[..dot].to_string(),
        _ => base.to_string(),
    }
}

/// Filename with one leading underscore removed
fn title_of(filename: &str) -> String {
    filename.strip_prefix('_').unwrap_or(filename).to_string()
}
