//! File-system events consumed by the manifest store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete change to one pattern file
///
/// The JSON form is `{"type":"added","path":"atoms/button.hbs"}`; renames
/// carry the previous location as well:
/// `{"type":"renamed","old":"atoms/button.hbs","path":"atoms/btn.hbs"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PatternEvent {
    /// A file appeared
    Added {
        /// Path of the new file
        path: String,
    },
    /// A file's contents changed
    Changed {
        /// Path of the changed file
        path: String,
    },
    /// A file disappeared
    Deleted {
        /// Path of the removed file
        path: String,
    },
    /// A file moved
    Renamed {
        /// Previous path
        old: String,
        /// New path
        path: String,
    },
}

impl PatternEvent {
    /// The path the event refers to (the new path for renames)
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path }
            | Self::Changed { path }
            | Self::Deleted { path }
            | Self::Renamed { path, .. } => path,
        }
    }

    /// Lowercase event name as used on the wire
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Changed { .. } => "changed",
            Self::Deleted { .. } => "deleted",
            Self::Renamed { .. } => "renamed",
        }
    }

    /// Parse one JSON line
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a valid event object
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim())
            .with_context(|| format!("Invalid pattern event: {}", line.trim()))
    }
}

impl fmt::Display for PatternEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renamed { old, path } => write!(f, "renamed {old} -> {path}"),
            other => write!(f, "{} {}", other.kind(), other.path()),
        }
    }
}
