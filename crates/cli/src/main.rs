//! savevault CLI - svault command

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod daemon;
mod locks;
mod logging;
mod util;

/// savevault - Unattended backups of save-game profiles
#[derive(Parser)]
#[command(name = "svault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a save directory and archive profiles as they change
    Watch(SettingsArgs),
    /// Show profiles and their archives
    Status(SettingsArgs),
    /// Print an example configuration file
    ExampleConfig,
}

/// Settings shared by commands that operate on a watched root
#[derive(Args, Clone, Default)]
pub struct SettingsArgs {
    /// Directory holding one subdirectory per profile
    /// (default: <config dir>/EldenRing)
    pub root: Option<PathBuf>,

    /// Configuration file (TOML, [watch] table)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bucket width: hour or day
    #[arg(short, long)]
    pub interval: Option<savevault_core::Granularity>,

    /// Archives kept per profile
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Archive ownership rule: legacy or delimited
    #[arg(long)]
    pub match_rule: Option<savevault_core::MatchRule>,

    /// Coalesce bursts of changes within this many milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Notification channel capacity
    #[arg(long)]
    pub event_buffer: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; the guard flushes file logs on exit
    let _guard = logging::init(cli.verbose, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Watch(settings) => cmd::watch::run(&settings).await,
        Commands::Status(settings) => cmd::status::run(&settings).await,
        Commands::ExampleConfig => cmd::config::run_example().await,
    }
}
