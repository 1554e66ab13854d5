//! # carwatch CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use carwatch_cli::ask::{run_ask, AskArgs};
use carwatch_cli::config::CliConfig;
use carwatch_cli::prefs::{run_prefs, PrefsArgs};
use carwatch_cli::review::{run_review, ReviewArgs};
use carwatch_cli::verify::{run_verify, VerifyArgs};
use carwatch_core::SystemClock;
use carwatch_store::{DataStore, RestDataStore};

/// carwatch: stolen-vehicle portal tools.
///
/// Verify car ownership, review verification requests, ask the help
/// assistant and manage notification preferences.
#[derive(Parser, Debug)]
#[command(name = "carwatch", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify ownership of a car (email, code, documents).
    Verify(VerifyArgs),

    /// Review ownership verification requests.
    Review(ReviewArgs),

    /// Ask the help assistant a question.
    Ask(AskArgs),

    /// Show or change notification preferences.
    Prefs(PrefsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "carwatch CLI starting");

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Verify(args) => {
            let store = connect(&config)?;
            let mut stdin = std::io::stdin().lock();
            run_verify(&args, store, Arc::new(SystemClock), &mut stdin, &mut stdout).await
        }
        Commands::Review(args) => run_review(&args, connect(&config)?, &mut stdout).await,
        Commands::Ask(args) => run_ask(&args, &mut stdout),
        Commands::Prefs(args) => {
            let path = config.preferences_path(|var| std::env::var(var).ok());
            run_prefs(&args, &path, &mut stdout)
        }
    }
}

fn connect(config: &CliConfig) -> Result<Arc<dyn DataStore>> {
    let store = RestDataStore::new(config.store_config()?).context("failed to build backend client")?;
    Ok(Arc::new(store))
}
