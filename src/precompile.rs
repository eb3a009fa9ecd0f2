//! Downstream precompile trigger.
//!
//! After every successful manifest write the store calls
//! [`Precompiler::trigger`]. The trigger carries no payload; the template
//! compiler re-reads the manifest itself. Triggers are fire-and-forget: the
//! store does not wait for a run to finish, so runs may overlap when events
//! arrive faster than one compile cycle.

use anyhow::{Context, Result, bail};
use command_group::CommandGroup;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{Level, debug, error, info, span, warn};
use which::which;

/// Something that can be told to recompile the pattern templates
pub trait Precompiler {
    /// Start a recompilation run without waiting for it
    ///
    /// # Errors
    ///
    /// Returns an error if the run could not be started
    fn trigger(&self) -> Result<()>;
}

impl<F> Precompiler for F
where
    F: Fn() -> Result<()>,
{
    fn trigger(&self) -> Result<()> {
        self()
    }
}

/// Precompiler used when no command is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPrecompiler;

impl Precompiler for NoopPrecompiler {
    fn trigger(&self) -> Result<()> {
        debug!("No precompile command configured, skipping");
        Ok(())
    }
}

/// Runs an external command as the precompile step
#[derive(Debug, Clone)]
pub struct CommandPrecompiler {
    /// Executable name or path
    program: String,
    /// Arguments passed to the program
    args: Vec<String>,
    /// Directory the command runs in (the project root)
    working_dir: PathBuf,
}

impl CommandPrecompiler {
    /// Build a precompiler from a shell-style command line
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty, has invalid quoting, or
    /// names a program that is not on `PATH`
    pub fn new(command: &str, working_dir: PathBuf) -> Result<Self> {
        let (program, args) = parse_command(command)?;
        which(&program)
            .with_context(|| format!("Precompile program '{program}' not found in PATH"))?;

        Ok(Self {
            program,
            args,
            working_dir,
        })
    }

    /// Program that will be spawned
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Precompiler for CommandPrecompiler {
    fn trigger(&self) -> Result<()> {
        let span = span!(Level::DEBUG, "precompile", program = %self.program);
        let _guard = span.enter();

        // Spawn as process group so the whole compile tree is reaped together
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .group_spawn()
            .with_context(|| format!("Failed to spawn precompile command: {}", self.program))?;

        info!(program = %self.program, "Precompile started");

        let program = self.program.clone();
        std::thread::Builder::new()
            .name("patman-precompile".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if status.success() => {
                    info!(program = %program, "Precompile finished");
                }
                Ok(status) => {
                    warn!(program = %program, exit_code = ?status.code(), "Precompile failed");
                }
                Err(e) => {
                    error!(program = %program, error = %e, "Failed to wait for precompile");
                }
            })
            .context("Failed to start precompile reaper thread")?;

        Ok(())
    }
}

/// Parse a command string into program and arguments
///
/// Handles shell-like quoting:
/// - `"npx gulp precompile"` → `("npx", ["gulp", "precompile"])`
/// - `"gulp --out='dist/js'"` → `("gulp", ["--out=dist/js"])`
///
/// # Errors
///
/// Returns an error for an empty command or unbalanced quotes
pub fn parse_command(cmd: &str) -> Result<(String, Vec<String>)> {
    let parts =
        shell_words::split(cmd).with_context(|| format!("Invalid command syntax: '{cmd}'"))?;

    let Some((program, args)) = parts.split_first() else {
        bail!("Empty precompile command");
    };

    debug!(program = %program, args = ?args, "Precompile command parsed");
    Ok((program.clone(), args.to_vec()))
}
