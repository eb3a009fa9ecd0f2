pub mod apply;
pub mod build;
pub mod events;
pub mod init;
pub mod list;
pub mod watch;

use crate::manifest::EventOutcome;
use colored::Colorize;

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Tally of outcomes across several events
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeTally {
    /// Events that rewrote the manifest
    pub persisted: usize,
    /// Events that only triggered precompile
    pub recompiled: usize,
    /// Events that changed nothing
    pub skipped: usize,
    /// Events whose write failed or that were rejected
    pub failed: usize,
}

impl OutcomeTally {
    /// Count one dispatch result; `None` means the event was rejected
    pub const fn record(&mut self, outcome: Option<EventOutcome>) {
        match outcome {
            Some(EventOutcome::Persisted) => self.persisted += 1,
            Some(EventOutcome::Recompiled) => self.recompiled += 1,
            Some(EventOutcome::Ignored | EventOutcome::Unmatched) => self.skipped += 1,
            Some(EventOutcome::WriteFailed) | None => self.failed += 1,
        }
    }
}
