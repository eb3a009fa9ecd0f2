use crate::config::Config;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::Path;

/// Write a default `patman.toml` and create the patterns root
///
/// # Errors
///
/// Returns an error if:
/// - The config file already exists and `force` is not set
/// - The config file or patterns directory cannot be created
pub fn execute(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite it",
            config_path.display()
        );
    }

    let config = Config::default();
    config
        .save(config_path)
        .context("Failed to save default configuration")?;

    let project_root = config_path.parent().unwrap_or_else(|| Path::new("."));
    let patterns_root = crate::utils::resolve_against(project_root, &config.patterns.root);
    std::fs::create_dir_all(&patterns_root).with_context(|| {
        format!(
            "Failed to create patterns directory: {}",
            patterns_root.display()
        )
    })?;

    super::print_success(&format!("Wrote {}", config_path.display()));
    println!("\n{}", "Quick start:".bold());
    println!("  patman build     # Scan patterns and write the manifest");
    println!("  patman watch     # Keep the manifest up to date");
    println!("  patman list      # Show known patterns");

    Ok(())
}
