use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::application::use_cases::sync_repository::SyncOrchestrator;
use crate::domain::entities::sync_outcome::CleanupState;
use crate::infrastructure::filesystem::settings_store::SettingsStore;

/// Arguments of `reposync cleanup`
#[derive(Debug, Clone, Args)]
pub struct CleanupArgs {
    /// Directory of a previous sync (ignored when --state-file is given)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// State file written by `reposync sync --state-file`
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

/// Handler for the cleanup command
pub struct CleanupCommand {
    args: CleanupArgs,
}

impl CleanupCommand {
    pub fn new(args: CleanupArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self) -> Result<()> {
        let state = match (&self.args.state_file, &self.args.path) {
            (Some(state_file), _) => SettingsStore::read_cleanup_state(state_file)
                .await
                .context("Failed to read state file")?,
            (None, Some(path)) => CleanupState::new(path),
            (None, None) => CleanupState::new(std::env::current_dir()?),
        };

        println!(
            "{} Removing credentials from {}",
            "::".blue().bold(),
            state.repository_path.display()
        );
        SyncOrchestrator::new().cleanup(&state).await?;
        println!("{} Cleanup completed!", "✓".green().bold());
        Ok(())
    }
}
