//! harpoon CLI
//!
//! Runs the agent's operations one at a time from the command line.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use harpoon_config::Settings;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = Settings::load(&cli.settings)?;
    settings.apply_env_overrides();
    tracing::debug!(?settings, "Settings loaded");

    match cli.command {
        Commands::SyncConfig { url } => commands::run_sync_config(&settings, url.as_deref()),
        Commands::RestoreConfig => commands::run_restore_config(&settings),
        Commands::Changes {
            repo,
            since,
            tags,
            content,
        } => commands::run_changes(&repo, since.as_deref(), &tags, content),
        Commands::Systemd {
            name,
            file,
            dest,
            enable,
            restart_always,
            root,
        } => commands::run_systemd(
            &settings,
            commands::SystemdArgs {
                name,
                file,
                dest,
                enable,
                restart_always,
                root,
            },
        ),
    }
}

/// Log to stderr at `info`, or `debug` with `--verbose`. `RUST_LOG` wins
/// over both.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{}: tracing subscriber already set", "warning".yellow());
    }
    if verbose {
        tracing::debug!("Verbose mode enabled");
    }
}
