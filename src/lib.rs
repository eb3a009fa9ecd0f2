#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # Patman - Incremental Pattern Manifest Builder
//!
//! Patman keeps a styleguide's pattern manifest (`patterns.json`) in sync
//! with the Handlebars templates on disk. A cold build scans the patterns
//! tree once; after that, file events are applied one at a time and the
//! manifest is rewritten and the template precompiler triggered after each
//! structural change.
//!
//! ## Architecture
//!
//! - [`manifest`]: the data model, event types, and the [`ManifestStore`]
//! - [`scanner`]: glob-filtered discovery of pattern templates
//! - [`watch`]: native file notifications translated into pattern events
//! - [`precompile`]: the downstream compile trigger
//! - [`fs`]: the file system seam the store writes through
//! - [`lock`]: single-writer lock on the manifest file
//! - [`config`]: `patman.toml` parsing and validation
//! - [`commands`]: CLI command implementations
//!
//! ## Example Usage
//!
//! ```no_run
//! use patman::PatmanContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = PatmanContext::new(None)?;
//! let mut store = ctx.open_store()?;
//! let report = store.bulk_scan(ctx.scanner()?.scan()?);
//! println!("{} patterns", report.after);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing and validation.
pub mod config;

/// File system access used by the manifest store.
pub mod fs;

/// Single-writer lock for the manifest file.
pub mod lock;

/// Manifest data model, events, and the store that owns them.
pub mod manifest;

/// Precompile trigger run after manifest writes.
pub mod precompile;

/// Pattern template discovery.
pub mod scanner;

/// Utility functions and helpers.
pub mod utils;

/// File watching and event translation.
pub mod watch;


use anyhow::{Context, Result};
use manifest::ManifestStore;
use precompile::{CommandPrecompiler, NoopPrecompiler, Precompiler};
use scanner::PatternScanner;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Current version of the patman binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "patman.toml";

/// Environment variable naming an alternate configuration file.
pub const CONFIG_ENV: &str = "PATMAN_CONFIG";

/// Central context for all patman operations.
///
/// Holds the project root (the directory containing the config file) and
/// the loaded configuration. Every relative path in the configuration is
/// resolved against the project root.
///
/// # Examples
///
/// ```no_run
/// use patman::PatmanContext;
/// use patman::config::Config;
///
/// // Context from ./patman.toml (or the defaults if it is absent)
/// let ctx = PatmanContext::new(None).unwrap();
///
/// // Context with an explicit root, for tests and embedding
/// let ctx = PatmanContext::new_explicit("/tmp/site".into(), Config::default());
/// assert!(ctx.manifest_path().ends_with("src/patterns/patterns.json"));
/// ```
#[derive(Debug, Clone)]
pub struct PatmanContext {
    /// Directory all configured paths are relative to.
    pub project_root: PathBuf,

    /// Path to the configuration file (which may not exist).
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl PatmanContext {
    /// Creates a context from a config file path, or `./patman.toml`.
    ///
    /// A missing config file means defaults. Unknown keys are reported on
    /// stderr but do not fail.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined or if
    /// the configuration file exists but is invalid.
    pub fn new(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = utils::make_absolute(
            config_override
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)),
        )?;

        let config = config::Config::load(&config_path)?;
        config::validator::ConfigValidator::new().warn_unknown_fields(&config_path);

        let project_root = config_path
            .parent()
            .map(Path::to_path_buf)
            .context("Config path has no parent directory")?;

        debug!(
            config = %config_path.display(),
            root = %project_root.display(),
            "Context created"
        );

        Ok(Self {
            project_root,
            config_path,
            config,
        })
    }

    /// Creates a context with an explicit project root and configuration.
    /// No file is read.
    #[must_use]
    pub fn new_explicit(project_root: PathBuf, config: config::Config) -> Self {
        let config_path = project_root.join(DEFAULT_CONFIG_FILE);
        Self {
            project_root,
            config_path,
            config,
        }
    }

    /// Absolute patterns root.
    #[must_use]
    pub fn patterns_root(&self) -> PathBuf {
        utils::resolve_against(&self.project_root, &self.config.patterns.root)
    }

    /// Absolute manifest file path.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        utils::resolve_against(&self.project_root, &self.config.manifest.path)
    }

    /// Scanner configured with this project's root and globs.
    ///
    /// # Errors
    /// Returns an error if a configured glob is invalid.
    pub fn scanner(&self) -> Result<PatternScanner> {
        PatternScanner::new(
            self.patterns_root(),
            &self.config.patterns.include,
            &self.config.patterns.exclude,
        )
    }

    /// Precompiler for the configured command, or a no-op when none is set.
    ///
    /// # Errors
    /// Returns an error if the command cannot be parsed or its program is
    /// not on `PATH`.
    pub fn precompiler(&self) -> Result<Box<dyn Precompiler>> {
        match &self.config.precompile.command {
            Some(command) => Ok(Box::new(CommandPrecompiler::new(
                command,
                self.project_root.clone(),
            )?)),
            None => Ok(Box::new(NoopPrecompiler)),
        }
    }

    /// Load the manifest store backed by the real file system.
    ///
    /// # Errors
    /// Returns an error if the precompiler cannot be built.
    pub fn open_store(&self) -> Result<ManifestStore> {
        Ok(ManifestStore::load(
            self.patterns_root(),
            self.manifest_path(),
            Box::new(fs::StdFileSystem),
            self.precompiler()?,
        ))
    }
}
