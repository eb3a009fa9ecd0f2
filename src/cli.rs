//! Command-line interface definitions for patman.
//!
//! This module contains all CLI argument parsing structures using clap's derive macros.
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes (#[arg(help = "...")]),
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::manifest::PatternEvent;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for patman.
#[derive(Parser)]
#[command(
    name = "patman",
    version = crate::VERSION,
    about = "Incremental pattern manifest builder for styleguides",
    long_about = "Keeps a styleguide's patterns.json in sync with its Handlebars templates and \
                  triggers the template precompiler after every change"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ./patman.toml)
    #[arg(short, long, global = true, env = crate::CONFIG_ENV, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Write a default patman.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Scan the patterns tree and rebuild the manifest
    Build,

    /// Watch the patterns tree and update the manifest on every change
    Watch {
        /// Skip the initial full scan
        #[arg(long)]
        no_build: bool,
    },

    /// Apply a single pattern event
    Apply {
        #[command(subcommand)]
        action: ApplyAction,
    },

    /// Apply JSON-lines pattern events read from stdin
    Events,

    /// Print the patterns in the manifest
    List {
        /// Include soft-deleted patterns
        #[arg(short, long)]
        all: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// A single event given on the command line.
///
/// Paths are relative to the patterns root, or absolute under it.
#[derive(Subcommand, Debug, Clone)]
pub enum ApplyAction {
    /// A pattern file appeared
    Added { path: String },

    /// A pattern file's contents changed
    Changed { path: String },

    /// A pattern file was removed
    Deleted { path: String },

    /// A pattern file was moved
    Renamed {
        /// Previous path
        old: String,
        /// New path
        new: String,
    },
}

impl From<ApplyAction> for PatternEvent {
    fn from(action: ApplyAction) -> Self {
        match action {
            ApplyAction::Added { path } => Self::Added { path },
            ApplyAction::Changed { path } => Self::Changed { path },
            ApplyAction::Deleted { path } => Self::Deleted { path },
            ApplyAction::Renamed { old, new } => Self::Renamed { old, path: new },
        }
    }
}
