//! Configuration loaded from `patman.toml`.
//!
//! Every section is optional. Relative paths are resolved against the
//! directory holding the config file (the project root).
//!
//! ```toml
//! [patterns]
//! root = "src/patterns"
//! include = ["**/*.hbs"]
//! exclude = ["**/_*"]
//!
//! [manifest]
//! path = "src/patterns/patterns.json"
//!
//! [precompile]
//! command = "npx gulp precompile"
//! ```

pub mod validator;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Where pattern templates live and which files count
    #[serde(default)]
    pub patterns: PatternsConfig,

    /// Where the manifest is written
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// What runs after each manifest write
    #[serde(default)]
    pub precompile: PrecompileConfig,
}

/// Pattern discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternsConfig {
    /// Patterns root, relative to the project root
    #[serde(default = "default_patterns_root")]
    pub root: PathBuf,
    /// Globs a pattern's relative path must match (any)
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Globs that exclude a path (partials by default)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// Manifest output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestConfig {
    /// Manifest file, relative to the project root
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,
}

/// Precompile trigger settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PrecompileConfig {
    /// Command line run after each successful write; none disables the trigger
    #[serde(default)]
    pub command: Option<String>,
}

fn default_patterns_root() -> PathBuf {
    PathBuf::from("src/patterns")
}

fn default_include() -> Vec<String> {
    vec!["**/*.hbs".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/_*".to_string()]
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("src/patterns/patterns.json")
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            root: default_patterns_root(),
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults if it is absent
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML or values that fail validation
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that TOML typing alone cannot
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.patterns.include.is_empty() {
            bail!("patterns.include must list at least one glob");
        }

        for pattern in self.patterns.include.iter().chain(&self.patterns.exclude) {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern: '{pattern}'"))?;
        }

        if self.manifest.path.as_os_str().is_empty() {
            bail!("manifest.path cannot be empty");
        }

        if let Some(command) = &self.precompile.command {
            crate::precompile::parse_command(command)
                .context("Invalid precompile.command")?;
        }

        Ok(())
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::utils::ensure_parent_dirs(path)?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
