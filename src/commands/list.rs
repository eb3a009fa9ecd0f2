use crate::PatmanContext;
use crate::manifest::{Manifest, PatternEntry};
use anyhow::{Context, Result};
use colored::Colorize;

/// Print the manifest's patterns
///
/// Reads the manifest file directly and takes no lock.
///
/// # Errors
///
/// Returns an error if the manifest exists but cannot be read or parsed
pub fn execute(ctx: &PatmanContext, all: bool, json: bool) -> Result<()> {
    let manifest_path = ctx.manifest_path();
    if !manifest_path.exists() {
        super::print_info(&format!(
            "No manifest at {}. Run 'patman build' first",
            manifest_path.display()
        ));
        return Ok(());
    }

    let text = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
    let manifest = Manifest::from_json(&text)?;
    let entries = select(&manifest, all);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialize patterns")?
        );
        return Ok(());
    }

    if entries.is_empty() {
        super::print_info("No patterns");
        return Ok(());
    }

    let width = entries.iter().map(|e| e.title.len()).max().unwrap_or(0);
    for entry in &entries {
        let title = format!("{:width$}", entry.title);
        if entry.is_deleted() {
            println!(
                "{}  {} {}",
                title.dimmed(),
                entry.filepath.dimmed(),
                "(deleted)".red()
            );
        } else {
            println!("{}  {}", title.bold(), entry.filepath);
        }
    }

    println!(
        "\n{} live, {} deleted",
        manifest.live_count(),
        manifest.patterns.len() - manifest.live_count()
    );
    Ok(())
}

/// Entries to show: live only unless `all`
fn select(manifest: &Manifest, all: bool) -> Vec<&PatternEntry> {
    manifest
        .patterns
        .iter()
        .filter(|e| all || !e.is_deleted())
        .collect()
}
