use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::application::use_cases::sync_repository::SyncOrchestrator;
use crate::domain::entities::sync_settings::{SubmoduleMode, SyncSettings};
use crate::domain::value_objects::secret::Secret;
use crate::domain::value_objects::server_url::ServerUrl;
use crate::infrastructure::filesystem::settings_store::{SettingsFile, SettingsStore};

/// Arguments of `reposync sync`. Flags override the settings file.
#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Repository as owner/name
    #[arg(short, long, env = "REPOSYNC_REPOSITORY")]
    pub repository: Option<String>,

    /// Directory to check out into (defaults to the current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the hosting server
    #[arg(long, env = "REPOSYNC_SERVER_URL")]
    pub server_url: Option<String>,

    /// Branch, tag or full ref to check out
    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Commit SHA to check out
    #[arg(long)]
    pub commit: Option<String>,

    /// Number of commits to fetch, 0 fetches all history
    #[arg(long)]
    pub fetch_depth: Option<u32>,

    /// Fetch tags even when fetch depth is not 0
    #[arg(long)]
    pub fetch_tags: bool,

    /// Print git progress output
    #[arg(long)]
    pub show_progress: bool,

    /// Partial clone filter, e.g. blob:none
    #[arg(long)]
    pub filter: Option<String>,

    /// Sparse checkout pattern (repeatable)
    #[arg(long = "sparse-checkout")]
    pub sparse_checkout: Vec<String>,

    /// Use non-cone sparse checkout patterns
    #[arg(long)]
    pub no_cone_mode: bool,

    /// Skip `git clean` and `git reset` on a reused workspace
    #[arg(long)]
    pub no_clean: bool,

    /// Submodules to check out: true, recursive or false
    #[arg(long)]
    pub submodules: Option<String>,

    /// Download Git LFS objects
    #[arg(long)]
    pub lfs: bool,

    /// Token used to fetch the repository
    #[arg(long, env = "REPOSYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SSH private key used to fetch the repository
    #[arg(long, env = "REPOSYNC_SSH_KEY", hide_env_values = true)]
    pub ssh_key: Option<String>,

    /// Additional known hosts entries
    #[arg(long)]
    pub ssh_known_hosts: Option<String>,

    /// Do not pass StrictHostKeyChecking=yes to ssh
    #[arg(long)]
    pub no_ssh_strict: bool,

    /// User for the SSH remote URL
    #[arg(long)]
    pub ssh_user: Option<String>,

    /// Remove credentials from the local git config after the sync
    #[arg(long)]
    pub no_persist_credentials: bool,

    /// Organization id added to the HTTPS-instead-of-SSH rewrite
    #[arg(long)]
    pub organization_id: Option<String>,

    /// Do not add the workspace to safe.directory
    #[arg(long)]
    pub no_safe_directory: bool,

    /// Git executable
    #[arg(long)]
    pub git: Option<PathBuf>,

    /// Write the state consumed by `reposync cleanup` to this JSON file
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Print the sync outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handler for the sync command
pub struct SyncCommand {
    args: SyncArgs,
    verbose: bool,
}

impl SyncCommand {
    pub fn new(args: SyncArgs, verbose: bool) -> Self {
        Self { args, verbose }
    }

    pub async fn execute(&self) -> Result<()> {
        let settings = self.build_settings().await?;

        if !self.args.json {
            println!(
                "{} Syncing {}/{} into {}",
                "::".blue().bold(),
                settings.repository_owner,
                settings.repository_name,
                settings.repository_path.display()
            );
        }

        let outcome = SyncOrchestrator::new()
            .sync(&settings)
            .await
            .context("Failed to sync repository")?;

        if let Some(state_file) = &self.args.state_file {
            SettingsStore::write_cleanup_state(state_file, &outcome.cleanup_state())
                .await
                .context("Failed to write state file")?;
        }

        if self.args.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        println!("{} Sync completed!", "✓".green().bold());
        if let Some(commit) = &outcome.commit {
            println!("  Commit: {}", commit.yellow());
        }
        if self.verbose {
            if let Some(reference) = &outcome.ref_name {
                println!("  Ref: {}", reference);
            }
            if outcome.used_archive_fallback {
                println!("  {}", "Downloaded as archive (git not available)".yellow());
            }
        }
        Ok(())
    }

    /// Settings file first, then flags on top.
    pub async fn build_settings(&self) -> Result<SyncSettings> {
        let args = &self.args;
        let file = match &args.config {
            Some(path) => SettingsStore::read_settings_file(path).await?,
            None => SettingsFile::default(),
        };
        let mut settings = file.into_settings(args.repository.as_deref(), args.path.as_deref())?;

        if let Some(server_url) = &args.server_url {
            settings.server_url = ServerUrl::new(server_url)?;
        }
        if let Some(reference) = &args.reference {
            settings.reference = Some(reference.clone());
        }
        if let Some(commit) = &args.commit {
            settings.commit = Some(commit.clone());
        }
        if let Some(depth) = args.fetch_depth {
            settings.fetch_depth = depth;
        }
        settings.fetch_tags |= args.fetch_tags;
        settings.show_progress |= args.show_progress;
        if let Some(filter) = &args.filter {
            settings.filter = Some(filter.clone());
        }
        if !args.sparse_checkout.is_empty() {
            settings.sparse_checkout = Some(args.sparse_checkout.clone());
        }
        if args.no_cone_mode {
            settings.sparse_checkout_cone_mode = false;
        }
        if args.no_clean {
            settings.clean = false;
        }
        if let Some(submodules) = &args.submodules {
            settings.submodules = submodules.parse::<SubmoduleMode>()?;
        }
        settings.lfs |= args.lfs;
        if let Some(token) = &args.token {
            settings.auth_token = Secret::new(token.clone());
        }
        if let Some(key) = args.ssh_key.as_ref().filter(|k| !k.is_empty()) {
            settings.ssh_key = Some(Secret::new(key.clone()));
        }
        if let Some(known_hosts) = &args.ssh_known_hosts {
            settings.ssh_known_hosts = Some(known_hosts.clone());
        }
        if args.no_ssh_strict {
            settings.ssh_strict = false;
        }
        if let Some(user) = &args.ssh_user {
            settings.ssh_user = user.clone();
        }
        if args.no_persist_credentials {
            settings.persist_credentials = false;
        }
        if let Some(id) = &args.organization_id {
            settings.workflow_organization_id = Some(id.clone());
        }
        if args.no_safe_directory {
            settings.set_safe_directory = false;
        }
        if let Some(git) = &args.git {
            settings.git_executable = git.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SyncArgs,
    }

    fn parse(argv: &[&str]) -> SyncArgs {
        let mut full = vec!["reposync"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    #[tokio::test]
    async fn test_flags_build_settings() {
        let args = parse(&[
            "--repository",
            "octo/hello",
            "--path",
            "/work/hello",
            "--ref",
            "develop",
            "--fetch-depth",
            "0",
            "--submodules",
            "recursive",
            "--no-clean",
            "--token",
            "abc",
        ]);
        let settings = SyncCommand::new(args, false).build_settings().await.unwrap();

        assert_eq!(settings.repository_owner, "octo");
        assert_eq!(settings.repository_name, "hello");
        assert_eq!(settings.repository_path, PathBuf::from("/work/hello"));
        assert_eq!(settings.reference.as_deref(), Some("develop"));
        assert_eq!(settings.fetch_depth, 0);
        assert_eq!(settings.submodules, SubmoduleMode::Recursive);
        assert!(!settings.clean);
        assert_eq!(settings.auth_token.expose(), "abc");
    }

    #[tokio::test]
    async fn test_flags_override_settings_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = temp.path().join("reposync.yml");
        std::fs::write(
            &config,
            "repository: octo/hello\nref: main\nfetch_depth: 5\nlfs: true\n",
        )
        .unwrap();

        let args = parse(&[
            "--config",
            config.to_str().unwrap(),
            "--path",
            "/work",
            "--ref",
            "release",
        ]);
        let settings = SyncCommand::new(args, false).build_settings().await.unwrap();

        assert_eq!(settings.reference.as_deref(), Some("release"));
        assert_eq!(settings.fetch_depth, 5);
        assert!(settings.lfs);
    }

    #[tokio::test]
    async fn test_missing_repository_is_rejected() {
        let args = parse(&["--path", "/work"]);
        assert!(SyncCommand::new(args, false).build_settings().await.is_err());
    }
}
