//! Manifest store: the single owner and writer of the pattern manifest.
//!
//! The store keeps the manifest in memory, applies one [`PatternEvent`] at a
//! time, and after every structural change runs a two-stage pipeline:
//!
//! 1. [`ManifestStore::persist`] overwrites the whole JSON file
//! 2. [`ManifestStore::notify_recompile`] fires the precompile trigger, only
//!    if stage 1 succeeded
//!
//! Stage 2 does not wait for the compiler. Nothing throttles or cancels
//! earlier runs, so a burst of events can leave several compiles in flight.
//! A failed write leaves the in-memory manifest ahead of the file until the
//! next successful write.

use super::{Manifest, PatternEntry, PatternEvent, default_folders};
use crate::fs::{FileSystem, PathKind};
use crate::precompile::Precompiler;
use crate::utils::to_manifest_path;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, trace, warn};

/// What applying one event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The path is a directory; nothing happened
    Ignored,
    /// No matching entry; nothing happened
    Unmatched,
    /// No structural change; precompile was triggered without a write
    Recompiled,
    /// The manifest was written and precompile triggered
    Persisted,
    /// The manifest changed in memory but the write failed
    WriteFailed,
}

/// Summary of a cold build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Entries before the scan (the loaded baseline)
    pub before: usize,
    /// Entries after the scan
    pub after: usize,
    /// New entries created
    pub added: usize,
    /// Scanned paths dropped because an entry already existed
    pub duplicates: usize,
    /// Whether the manifest file was written
    pub written: bool,
}

/// Owns the in-memory manifest and its JSON file
pub struct ManifestStore {
    /// Patterns root; manifest paths are relative to it
    root: PathBuf,
    /// Location of the JSON manifest
    manifest_path: PathBuf,
    /// Current manifest contents
    manifest: Manifest,
    /// Number of entries found at load time
    baseline: usize,
    /// Disk access
    fs: Box<dyn FileSystem>,
    /// Downstream compile trigger
    precompiler: Box<dyn Precompiler>,
}

impl ManifestStore {
    /// Load the manifest at `manifest_path`, or start empty
    ///
    /// A missing, empty, or unparseable file is not an error: the store
    /// starts with no patterns and the compiled-in folder list, and a warning
    /// is logged. Loaded entries are not checked against the disk.
    pub fn load(
        root: PathBuf,
        manifest_path: PathBuf,
        fs: Box<dyn FileSystem>,
        precompiler: Box<dyn Precompiler>,
    ) -> Self {
        let span = span!(Level::DEBUG, "load_manifest", path = %manifest_path.display());
        let _guard = span.enter();

        let manifest = match fs.read_to_string(&manifest_path) {
            Ok(text) if text.trim().is_empty() => {
                warn!(path = %manifest_path.display(), "Manifest file is empty, starting fresh");
                Manifest::new()
            }
            Ok(text) => match Manifest::from_json(&text) {
                Ok(mut manifest) => {
                    if manifest.folder.is_empty() {
                        manifest.folder = default_folders();
                    }
                    manifest
                }
                Err(e) => {
                    warn!(
                        path = %manifest_path.display(),
                        error = %format!("{e:#}"),
                        "Manifest file is corrupt, starting fresh"
                    );
                    Manifest::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %manifest_path.display(), "No manifest file found, starting fresh");
                Manifest::new()
            }
            Err(e) => {
                warn!(
                    path = %manifest_path.display(),
                    error = %e,
                    "Failed to read manifest, starting fresh"
                );
                Manifest::new()
            }
        };

        let baseline = manifest.patterns.len();
        info!(path = %manifest_path.display(), baseline, "Pattern manifest loaded");

        Self {
            root,
            manifest_path,
            manifest,
            baseline,
            fs,
            precompiler,
        }
    }

    /// Patterns root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the JSON manifest
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Current manifest contents
    #[must_use]
    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// All entries, tombstones included
    #[must_use]
    pub fn patterns(&self) -> &[PatternEntry] {
        &self.manifest.patterns
    }

    /// Entries that are not tombstones
    pub fn live_patterns(&self) -> impl Iterator<Item = &PatternEntry> {
        self.manifest.live()
    }

    /// Number of entries present when the manifest was loaded
    #[must_use]
    pub const fn baseline(&self) -> usize {
        self.baseline
    }

    /// Merge a full scan of the patterns tree into the manifest
    ///
    /// Paths may be absolute under the root or relative to it. A path whose
    /// `filepath` already has an entry (loaded or earlier in the batch) is
    /// dropped and the existing entry is kept unchanged. The folder list is
    /// reset to the compiled-in categories, then the manifest is sorted,
    /// written, and precompile triggered.
    pub fn bulk_scan<I, P>(&mut self, paths: I) -> ScanReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let span = span!(Level::DEBUG, "bulk_scan", root = %self.root.display());
        let _guard = span.enter();

        let before = self.manifest.patterns.len();
        let mut seen: HashSet<String> = self
            .manifest
            .patterns
            .iter()
            .map(|e| e.filepath.clone())
            .collect();
        let mut added = 0;
        let mut duplicates = 0;

        for path in paths {
            let raw = path.as_ref().to_string_lossy();
            let Some(filepath) = to_manifest_path(&self.root, &raw) else {
                warn!(path = %raw, "Skipping path outside the patterns root");
                continue;
            };

            if !seen.insert(filepath.clone()) {
                trace!(filepath = %filepath, "Duplicate pattern, keeping existing entry");
                duplicates += 1;
                continue;
            }

            self.manifest
                .patterns
                .push(PatternEntry::from_manifest_path(&filepath));
            added += 1;
        }

        self.manifest.sort();
        self.manifest.folder = default_folders();

        let after = self.manifest.patterns.len();
        info!(before, after, added, duplicates, "Pattern scan complete");

        let written = self.publish() == EventOutcome::Persisted;
        ScanReport {
            before,
            after,
            added,
            duplicates,
            written,
        }
    }

    /// Apply one event, logging and swallowing any error
    ///
    /// This is the boundary the watch loop calls. It never fails; `None`
    /// means the event was rejected and logged.
    pub fn dispatch(&mut self, event: &PatternEvent) -> Option<EventOutcome> {
        match self.apply(event) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(
                    event = event.kind(),
                    path = %event.path(),
                    error = %format!("{e:#}"),
                    "Failed to handle pattern event"
                );
                None
            }
        }
    }

    /// Apply one event to the manifest
    ///
    /// | event | entry state | effect |
    /// |---|---|---|
    /// | added | none | insert, write, precompile |
    /// | added | tombstone | revive, write, precompile |
    /// | added / changed | live | precompile only |
    /// | changed | none or tombstone | as added |
    /// | deleted | live | mark deleted, write, precompile |
    /// | renamed | any at old path | move, revive, write, precompile |
    ///
    /// `changed` only precompiles when a live entry exists. On a tombstone it
    /// does more than that: the entry is revived and the manifest rewritten,
    /// since the file event proves the pattern is back on disk.
    ///
    /// Events on directories are ignored. Deletes and renames with no
    /// matching entry do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a path lies outside the patterns root or
    /// normalizes to nothing. Write failures are not errors; they are logged
    /// and reported as [`EventOutcome::WriteFailed`].
    pub fn apply(&mut self, event: &PatternEvent) -> Result<EventOutcome> {
        let span = span!(Level::DEBUG, "apply", event = event.kind(), path = %event.path());
        let _guard = span.enter();

        let filepath = self.resolve(event.path())?;

        if self.is_directory(&filepath) {
            debug!(filepath = %filepath, "Directory event ignored");
            return Ok(EventOutcome::Ignored);
        }

        let outcome = match event {
            PatternEvent::Added { .. } => self.on_added(&filepath),
            PatternEvent::Changed { .. } => {
                if self.manifest.find_live(&filepath).is_some() {
                    debug!(filepath = %filepath, "Pattern changed");
                    self.notify_recompile();
                    EventOutcome::Recompiled
                } else {
                    self.on_added(&filepath)
                }
            }
            PatternEvent::Deleted { .. } => self.on_deleted(&filepath),
            PatternEvent::Renamed { old, .. } => {
                let old_filepath = self.resolve(old)?;
                self.on_renamed(&old_filepath, &filepath)
            }
        };

        Ok(outcome)
    }

    /// Overwrite the manifest file with the current in-memory manifest
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn persist(&self) -> Result<()> {
        let json = self.manifest.to_json()?;
        self.fs
            .write_atomic(&self.manifest_path, json.as_bytes())
            .with_context(|| {
                format!(
                    "Failed to write manifest to {}",
                    self.manifest_path.display()
                )
            })?;

        debug!(
            path = %self.manifest_path.display(),
            patterns = self.manifest.patterns.len(),
            "Manifest written"
        );
        Ok(())
    }

    /// Fire the precompile trigger without waiting for it
    ///
    /// A trigger that fails to start is logged, not returned.
    pub fn notify_recompile(&self) {
        if let Err(e) = self.precompiler.trigger() {
            error!(error = %format!("{e:#}"), "Failed to trigger precompile");
        }
    }

    /// Normalize an event path into a manifest `filepath`
    fn resolve(&self, raw: &str) -> Result<String> {
        to_manifest_path(&self.root, raw).with_context(|| {
            format!(
                "Path '{raw}' is not a pattern file under {}",
                self.root.display()
            )
        })
    }

    /// Stat check done before dispatch; a vanished path counts as not a directory
    fn is_directory(&self, filepath: &str) -> bool {
        match self.fs.kind(&self.root.join(filepath)) {
            Ok(Some(PathKind::Directory)) => true,
            Ok(_) => false,
            Err(e) => {
                debug!(filepath = %filepath, error = %e, "Stat failed, treating as file");
                false
            }
        }
    }

    /// Handle `added`, and `changed` for unknown paths
    fn on_added(&mut self, filepath: &str) -> EventOutcome {
        match self.manifest.locate(filepath) {
            Some(index) if !self.manifest.patterns[index].is_deleted() => {
                debug!(filepath = %filepath, "Pattern already present");
                self.notify_recompile();
                EventOutcome::Recompiled
            }
            Some(index) => {
                self.manifest.patterns[index].relocate(filepath);
                info!(filepath = %filepath, "Pattern restored");
                self.sort_and_publish()
            }
            None => {
                self.manifest
                    .patterns
                    .push(PatternEntry::from_manifest_path(filepath));
                info!(filepath = %filepath, "Pattern added");
                self.sort_and_publish()
            }
        }
    }

    /// Handle `deleted`
    fn on_deleted(&mut self, filepath: &str) -> EventOutcome {
        let Some(index) = self.manifest.find_live(filepath) else {
            trace!(filepath = %filepath, "Delete for unknown pattern");
            return EventOutcome::Unmatched;
        };

        self.manifest.patterns[index].mark_deleted();
        info!(filepath = %filepath, "Pattern deleted");
        self.sort_and_publish()
    }

    /// Handle `renamed`
    fn on_renamed(&mut self, old_filepath: &str, filepath: &str) -> EventOutcome {
        let Some(source) = self.manifest.locate(old_filepath) else {
            trace!(old = %old_filepath, filepath = %filepath, "Rename for unknown pattern");
            return EventOutcome::Unmatched;
        };

        match self.manifest.locate(filepath) {
            // Target already has an entry: keep it and retire the source
            Some(target) if target != source => {
                self.manifest.patterns[target].relocate(filepath);
                self.manifest.patterns[source].mark_deleted();
            }
            _ => self.manifest.patterns[source].relocate(filepath),
        }

        info!(old = %old_filepath, filepath = %filepath, "Pattern renamed");
        self.sort_and_publish()
    }

    /// Restore ordering after a mutation, then write and trigger
    fn sort_and_publish(&mut self) -> EventOutcome {
        self.manifest.sort();
        self.publish()
    }

    /// Stage 1 then stage 2; stage 2 only after a successful write
    fn publish(&self) -> EventOutcome {
        match self.persist() {
            Ok(()) => {
                self.notify_recompile();
                EventOutcome::Persisted
            }
            Err(e) => {
                error!(
                    path = %self.manifest_path.display(),
                    error = %format!("{e:#}"),
                    "Manifest write failed, keeping in-memory state"
                );
                EventOutcome::WriteFailed
            }
        }
    }
}
