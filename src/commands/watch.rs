use crate::PatmanContext;
use crate::lock::ManifestLock;
use crate::watch::{self, EventTranslator};
use anyhow::{Context, Result};

/// Optionally cold-build, then apply file events until interrupted
///
/// The manifest lock is held for the whole session.
///
/// # Errors
///
/// Returns an error if:
/// - Another process holds the manifest lock
/// - The scanner or precompiler cannot be built from the config
/// - The initial scan fails
/// - The patterns root cannot be watched
pub fn execute(ctx: &PatmanContext, no_build: bool) -> Result<()> {
    let _lock = ManifestLock::acquire(&ctx.manifest_path())?;
    let mut store = ctx.open_store()?;

    if !no_build {
        let report = super::build::run(ctx, &mut store)?;
        if report.written {
            super::print_success(&format!(
                "Manifest written ({} patterns, {} new)",
                report.after, report.added
            ));
        } else {
            super::print_warning("Initial manifest write failed, continuing to watch");
        }
    }

    let patterns_root = ctx.patterns_root();
    std::fs::create_dir_all(&patterns_root).with_context(|| {
        format!(
            "Failed to create patterns directory: {}",
            patterns_root.display()
        )
    })?;
    super::print_info(&format!(
        "Watching {} (Ctrl-C to stop)",
        patterns_root.display()
    ));

    watch::run(&mut store, EventTranslator::new(ctx.scanner()?))
}
