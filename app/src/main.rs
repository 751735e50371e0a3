//! Scout command-line shell.
//!
//! Thin entry point that parses arguments, loads configuration and hands off
//! to the commands. Discovery, scoring and persistence live in `crates/`.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scout_core::AppConfig;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "scout",
    version,
    about = "Discover job listings and score them against your resume"
)]
struct Cli {
    /// Configuration file (defaults to the XDG config directory)
    #[arg(long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output from every crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect listings from a recommendation page into the database
    Discover(commands::discover::DiscoverArgs),
    /// Score listings that have not been evaluated yet
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Print evaluated listings, best first
    Review(commands::review::ReviewArgs),
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info,scout=debug" })
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    };
    config.apply_env_overrides();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting Scout v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Discover(args) => commands::discover::run(&config, args).await,
        Command::Evaluate(args) => commands::evaluate::run(&config, args).await,
        Command::Review(args) => commands::review::run(&config, &args).await,
    }
}
