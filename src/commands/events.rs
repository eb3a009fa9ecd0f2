use super::OutcomeTally;
use crate::PatmanContext;
use crate::lock::ManifestLock;
use crate::manifest::{ManifestStore, PatternEvent};
use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::warn;

/// Apply JSON-lines events read from `input`, one at a time
///
/// Blank lines are skipped. A malformed line is reported and skipped; it
/// does not stop the stream.
///
/// # Errors
///
/// Returns an error if:
/// - Another process holds the manifest lock
/// - The precompiler cannot be built from the config
/// - Reading the input fails
pub fn execute<R: BufRead>(ctx: &PatmanContext, input: R) -> Result<OutcomeTally> {
    let _lock = ManifestLock::acquire(&ctx.manifest_path())?;
    let mut store = ctx.open_store()?;

    let tally = run(&mut store, input)?;

    super::print_success(&format!(
        "Processed events: {} written, {} recompiled, {} skipped, {} failed",
        tally.persisted, tally.recompiled, tally.skipped, tally.failed
    ));
    if tally.failed > 0 {
        super::print_error(&format!(
            "{} events were rejected or not written, see the log for details",
            tally.failed
        ));
    }
    Ok(tally)
}

/// Feed every event line from `input` to `store`
///
/// # Errors
///
/// Returns an error if reading the input fails
pub fn run<R: BufRead>(store: &mut ManifestStore, input: R) -> Result<OutcomeTally> {
    let mut tally = OutcomeTally::default();

    for (number, line) in input.lines().enumerate() {
        let line = line.context("Failed to read event stream")?;
        if line.trim().is_empty() {
            continue;
        }

        match PatternEvent::from_json_line(&line) {
            Ok(event) => tally.record(store.dispatch(&event)),
            Err(e) => {
                warn!(line = number + 1, error = %format!("{e:#}"), "Skipping malformed event");
                tally.record(None);
            }
        }
    }

    Ok(tally)
}
