use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Flags configuration keys patman does not recognize
///
/// Serde ignores unknown keys, so a typo such as `patterns.inlcude` would
/// otherwise silently fall back to the default.
pub struct ConfigValidator {
    /// Dotted paths of every recognized leaf field
    known_fields: HashSet<&'static str>,
    /// Dotted paths of every recognized section
    known_sections: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_sections = HashSet::from(["patterns", "manifest", "precompile"]);
        let known_fields = HashSet::from([
            "patterns.root",
            "patterns.include",
            "patterns.exclude",
            "manifest.path",
            "precompile.command",
        ]);

        Self {
            known_fields,
            known_sections,
        }
    }

    /// Return the dotted paths of unknown keys in a config file
    ///
    /// A missing file has no unknown keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn unknown_fields(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        self.unknown_fields_in(&content)
    }

    /// Return the dotted paths of unknown keys in config text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML
    pub fn unknown_fields_in(&self, content: &str) -> Result<Vec<String>> {
        let parsed: toml::Table = toml::from_str(content).context("Failed to parse TOML config")?;

        let mut unknown = Vec::new();
        for (section, value) in &parsed {
            if !self.known_sections.contains(section.as_str()) {
                unknown.push(section.clone());
                continue;
            }

            if let toml::Value::Table(fields) = value {
                for key in fields.keys() {
                    let full_key = format!("{section}.{key}");
                    if !self.known_fields.contains(full_key.as_str()) {
                        unknown.push(full_key);
                    }
                }
            } else {
                unknown.push(section.clone());
            }
        }

        unknown.sort();
        Ok(unknown)
    }

    /// Print a warning block for unknown keys, if any
    pub fn warn_unknown_fields(&self, config_path: &Path) {
        match self.unknown_fields(config_path) {
            Ok(unknown) if !unknown.is_empty() => {
                eprintln!("{}", "Configuration warnings:".yellow().bold());
                for field in unknown {
                    eprintln!("  Unknown configuration field: {}", field.yellow());
                }
                eprintln!();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %format!("{e:#}"), "Skipping config field check");
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
