#![allow(dead_code)]

use anyhow::Result;
use patman::PatmanContext;
use patman::config::Config;
use patman::fs::StdFileSystem;
use patman::manifest::{Manifest, ManifestStore};
use patman::precompile::Precompiler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Styleguide project fixture: a temp dir with a patterns root and default config
pub struct TestSite {
    pub temp_dir: TempDir,
    pub ctx: PatmanContext,
    triggers: Arc<AtomicUsize>,
}

impl TestSite {
    /// Create an empty project with the default layout
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let ctx = PatmanContext::new_explicit(temp_dir.path().to_path_buf(), Config::default());
        std::fs::create_dir_all(ctx.patterns_root())?;

        Ok(Self {
            temp_dir,
            ctx,
            triggers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Project root directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute patterns root
    pub fn root(&self) -> PathBuf {
        self.ctx.patterns_root()
    }

    /// Write a template under the patterns root
    pub fn write_pattern(&self, relative: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, "<div>{{content}}</div>")?;
        Ok(path)
    }

    /// Load a store on the real file system with a counting precompiler
    pub fn open_store(&self) -> ManifestStore {
        let triggers = Arc::clone(&self.triggers);
        let precompiler: Box<dyn Precompiler> = Box::new(move || -> Result<()> {
            triggers.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        ManifestStore::load(
            self.root(),
            self.ctx.manifest_path(),
            Box::new(StdFileSystem),
            precompiler,
        )
    }

    /// How many times the precompiler fired across all stores
    pub fn trigger_count(&self) -> usize {
        self.triggers.load(Ordering::SeqCst)
    }

    /// Parse the manifest file from disk
    pub fn read_manifest(&self) -> Result<Manifest> {
        let text = std::fs::read_to_string(self.ctx.manifest_path())?;
        Manifest::from_json(&text)
    }

    /// Raw manifest text from disk
    pub fn manifest_text(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.ctx.manifest_path())?)
    }
}
