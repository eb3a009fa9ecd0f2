//! File watching for pattern templates
//!
//! Subscribes to native file-system notifications under the patterns root,
//! translates them into [`PatternEvent`]s, and feeds them to the
//! [`ManifestStore`] strictly one at a time on the calling thread.
//!
//! Platforms report renames differently: some deliver one event carrying
//! both paths, others deliver a `From` half followed by a `To` half. The
//! [`EventTranslator`] pairs split halves and falls back to add/delete when
//! it cannot. The inotify backend sends both forms for one rename (`From`,
//! `To`, then `Both` with the same tracker); the trailing `Both` is dropped.

use crate::manifest::{ManifestStore, PatternEvent};
use crate::scanner::PatternScanner;
use anyhow::{Context, Result};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Maps raw notifications to pattern events
pub struct EventTranslator {
    /// Decides which paths are patterns and relativizes them
    scanner: PatternScanner,
    /// First half of a split rename, waiting for its `To`
    pending_rename: Option<PathBuf>,
    /// Tracker of the last split rename already emitted
    paired_tracker: Option<usize>,
}

impl EventTranslator {
    /// Create a translator filtering with `scanner`'s globs
    #[must_use]
    pub const fn new(scanner: PatternScanner) -> Self {
        Self {
            scanner,
            pending_rename: None,
            paired_tracker: None,
        }
    }

    /// Directory being watched
    #[must_use]
    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    /// Translate one notification into zero or more pattern events
    pub fn translate(&mut self, event: &Event) -> Vec<PatternEvent> {
        trace!(kind = ?event.kind, paths = ?event.paths, "Raw file event");

        match event.kind {
            EventKind::Create(_) => self.each(event, |path| PatternEvent::Added { path }),
            EventKind::Remove(_) => self.each(event, |path| PatternEvent::Deleted { path }),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if event.tracker().is_some() && event.tracker() == self.paired_tracker {
                    trace!(tracker = ?event.tracker(), "Rename already emitted from split halves");
                    self.paired_tracker = None;
                    return Vec::new();
                }
                match event.paths.as_slice() {
                    [from, to] => self.rename(from, to).into_iter().collect(),
                    _ => self.each(event, |path| PatternEvent::Added { path }),
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                let events = self.flush_pending();
                self.pending_rename = event.paths.first().cloned();
                events
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                let Some(to) = event.paths.first() else {
                    return Vec::new();
                };
                match self.pending_rename.take() {
                    Some(from) => {
                        self.paired_tracker = event.tracker();
                        self.rename(&from, to).into_iter().collect()
                    }
                    None => self.each(event, |path| PatternEvent::Added { path }),
                }
            }
            // Ambiguous name change: decide by whether the path is still there
            EventKind::Modify(ModifyKind::Name(_)) => event
                .paths
                .iter()
                .filter_map(|path| {
                    let rel = self.scanner.pattern_path(path)?;
                    Some(if path.exists() {
                        PatternEvent::Added { path: rel }
                    } else {
                        PatternEvent::Deleted { path: rel }
                    })
                })
                .collect(),
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => {
                self.each(event, |path| PatternEvent::Changed { path })
            }
            _ => Vec::new(),
        }
    }

    /// Emit a `deleted` for a `From` half that never got its `To`
    ///
    /// The watch loop calls this when the event stream goes idle.
    pub fn flush_pending(&mut self) -> Vec<PatternEvent> {
        self.pending_rename
            .take()
            .and_then(|from| self.scanner.pattern_path(&from))
            .map(|path| PatternEvent::Deleted { path })
            .into_iter()
            .collect()
    }

    /// Build a rename, degrading to add/delete when only one side is a pattern
    fn rename(&self, from: &Path, to: &Path) -> Option<PatternEvent> {
        match (self.scanner.pattern_path(from), self.scanner.pattern_path(to)) {
            (Some(old), Some(path)) => Some(PatternEvent::Renamed { old, path }),
            (Some(path), None) => Some(PatternEvent::Deleted { path }),
            (None, Some(path)) => Some(PatternEvent::Added { path }),
            (None, None) => None,
        }
    }

    /// One event per matching path
    fn each(&self, event: &Event, make: impl Fn(String) -> PatternEvent) -> Vec<PatternEvent> {
        event
            .paths
            .iter()
            .filter_map(|path| self.scanner.pattern_path(path))
            .map(make)
            .collect()
    }
}

/// How long the loop waits before treating an unpaired rename half as a delete
const RENAME_PAIR_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

/// Watch the patterns root and apply events until the watcher shuts down
///
/// Events are handled one at a time. Errors for individual events are
/// logged by [`ManifestStore::dispatch`] and do not stop the loop.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or the root cannot be
/// watched
pub fn run(store: &mut ManifestStore, mut translator: EventTranslator) -> Result<()> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher =
        notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let root = translator.root().to_path_buf();
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    info!(root = %root.display(), "Watching for pattern changes");

    loop {
        let received = if translator.pending_rename.is_some() {
            rx.recv_timeout(RENAME_PAIR_TIMEOUT)
        } else {
            rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected)
        };

        let events = match received {
            Ok(Ok(event)) => translator.translate(&event),
            Ok(Err(e)) => {
                warn!(error = %e, "File watcher error");
                continue;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => translator.flush_pending(),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        for event in events {
            debug!(%event, "Dispatching pattern event");
            store.dispatch(&event);
        }
    }

    info!("File watcher stopped");
    Ok(())
}
