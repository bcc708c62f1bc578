pub mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::exit;
use tracing_subscriber::EnvFilter;

use commands::{CleanupArgs, CleanupCommand, SyncArgs, SyncCommand};

/// reposync - Check out a remote git repository into a local directory
#[derive(Parser)]
#[command(name = "reposync")]
#[command(about = "Check out a remote git repository into a local directory")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " ",
    env!("BUILD_DATE"),
    ")"
))]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and check out a repository
    Sync(SyncArgs),

    /// Remove credentials left behind by a previous sync
    Cleanup(CleanupArgs),
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    /// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_logging(&self) {
        let default_level = if self.cli.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(!self.cli.no_color)
            .with_target(false)
            .init();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        colored::control::set_override(!self.cli.no_color);

        match self.handle_command().await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    async fn handle_command(&self) -> anyhow::Result<()> {
        match &self.cli.command {
            Commands::Sync(args) => SyncCommand::new(args.clone(), self.cli.verbose).execute().await,
            Commands::Cleanup(args) => CleanupCommand::new(args.clone()).execute().await,
        }
    }
}
