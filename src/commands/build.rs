use crate::PatmanContext;
use crate::lock::ManifestLock;
use crate::manifest::{ManifestStore, ScanReport};
use anyhow::{Result, bail};

/// Scan the patterns tree and merge it into the manifest
///
/// # Errors
///
/// Returns an error if:
/// - Another process holds the manifest lock
/// - The scanner or precompiler cannot be built from the config
/// - The patterns tree cannot be walked
/// - The manifest could not be written
pub fn execute(ctx: &PatmanContext) -> Result<ScanReport> {
    let _lock = ManifestLock::acquire(&ctx.manifest_path())?;
    let mut store = ctx.open_store()?;
    let report = run(ctx, &mut store)?;

    if !report.written {
        bail!(
            "Failed to write manifest to {}",
            ctx.manifest_path().display()
        );
    }

    super::print_success(&format!(
        "Manifest written to {} ({} patterns, {} new)",
        ctx.manifest_path().display(),
        report.after,
        report.added
    ));
    if report.duplicates > 0 {
        super::print_info(&format!(
            "{} already-known patterns kept unchanged",
            report.duplicates
        ));
    }

    Ok(report)
}

/// Scan and bulk-merge into an already opened store
///
/// # Errors
///
/// Returns an error if the scanner cannot be built or the walk fails
pub fn run(ctx: &PatmanContext, store: &mut ManifestStore) -> Result<ScanReport> {
    let paths = ctx.scanner()?.scan()?;
    Ok(store.bulk_scan(paths))
}
