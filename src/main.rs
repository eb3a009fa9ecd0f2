use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use patman::cli::{Cli, Commands};
use patman::{DEFAULT_CONFIG_FILE, PatmanContext, commands, utils};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Init { force } => {
            let config_path = utils::make_absolute(
                cli.config
                    .as_deref()
                    .unwrap_or_else(|| std::path::Path::new(DEFAULT_CONFIG_FILE)),
            )?;
            commands::init::execute(&config_path, force)?;
        }
        Commands::Build => {
            let ctx = PatmanContext::new(cli.config)?;
            commands::build::execute(&ctx)?;
        }
        Commands::Watch { no_build } => {
            let ctx = PatmanContext::new(cli.config)?;
            commands::watch::execute(&ctx, no_build)?;
        }
        Commands::Apply { action } => {
            let ctx = PatmanContext::new(cli.config)?;
            commands::apply::execute(&ctx, &action.into())?;
        }
        Commands::Events => {
            let ctx = PatmanContext::new(cli.config)?;
            commands::events::execute(&ctx, io::stdin().lock())?;
        }
        Commands::List { all, json } => {
            let ctx = PatmanContext::new(cli.config)?;
            commands::list::execute(&ctx, all, json)?;
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

/// Install the log subscriber; `RUST_LOG` overrides the flag-derived level
fn init_tracing(verbose: bool, quiet: bool) {
    let default_directive = if verbose {
        "patman=debug"
    } else if quiet {
        "patman=warn"
    } else {
        "patman=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
