use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;
use crate::common::retry::{RetryExecutor, RetryPolicy};
use crate::domain::value_objects::git_version::GitVersion;
use crate::infrastructure::git::ref_resolver::TAGS_REFSPEC;
use crate::infrastructure::process::{CommandExecutor, ExecutionConfig};

/// Oldest git with protocol v2 support.
pub const MINIMUM_GIT_VERSION: GitVersion = GitVersion::new(2, 18, None);
pub const MINIMUM_GIT_SPARSE_CHECKOUT_VERSION: GitVersion = GitVersion::new(2, 28, None);
pub const MINIMUM_GIT_LFS_VERSION: GitVersion = GitVersion::new(2, 1, None);

/// Options applied to `git fetch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub filter: Option<String>,
    /// 0 fetches everything (and unshallows an existing shallow clone)
    pub fetch_depth: u32,
    pub fetch_tags: bool,
    pub show_progress: bool,
}

/// Exit code and stdout of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub exit_code: i32,
    pub stdout: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Options for constructing a [`GitCommandManager`].
#[derive(Debug, Clone)]
pub struct GitManagerOptions {
    pub executable: PathBuf,
    pub lfs: bool,
    pub sparse_checkout: bool,
    pub retry: RetryPolicy,
}

impl Default for GitManagerOptions {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("git"),
            lfs: false,
            sparse_checkout: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Typed surface over the git executable.
///
/// Methods prefixed with `try_` report failure through their return value
/// instead of an error; everything else fails on a non-zero exit.
#[async_trait]
pub trait GitCommands: Send + Sync {
    fn version(&self) -> GitVersion;

    fn working_directory(&self) -> &Path;

    /// Add or replace a variable in the environment overlay.
    fn set_environment_variable(&self, name: &str, value: &str);

    fn remove_environment_variable(&self, name: &str);

    async fn branch_delete(&self, remote: bool, branch: &str) -> ReposyncResult<()>;

    async fn branch_exists(&self, remote: bool, pattern: &str) -> ReposyncResult<bool>;

    /// Local branch names, or `origin/...` names when `remote` is set.
    async fn branch_list(&self, remote: bool) -> ReposyncResult<Vec<String>>;

    async fn checkout(&self, reference: &str, start_point: Option<&str>) -> ReposyncResult<()>;

    async fn checkout_detach(&self) -> ReposyncResult<()>;

    async fn config(&self, key: &str, value: &str, global: bool, add: bool) -> ReposyncResult<()>;

    async fn config_exists(&self, key: &str, global: bool) -> ReposyncResult<bool>;

    async fn fetch(&self, refspecs: &[String], options: &FetchOptions) -> ReposyncResult<()>;

    /// Default branch of `repository_url` as `refs/heads/<name>`.
    async fn default_branch(&self, repository_url: &str) -> ReposyncResult<String>;

    async fn init(&self) -> ReposyncResult<()>;

    async fn is_detached(&self) -> ReposyncResult<bool>;

    async fn lfs_fetch(&self, reference: &str) -> ReposyncResult<()>;

    async fn lfs_install(&self) -> ReposyncResult<()>;

    async fn log1(&self, format: Option<&str>) -> ReposyncResult<String>;

    async fn remote_add(&self, name: &str, url: &str) -> ReposyncResult<()>;

    async fn rev_parse(&self, reference: &str) -> ReposyncResult<String>;

    async fn sha_exists(&self, sha: &str) -> ReposyncResult<bool>;

    async fn sparse_checkout(&self, patterns: &[String]) -> ReposyncResult<()>;

    async fn sparse_checkout_non_cone_mode(&self, patterns: &[String]) -> ReposyncResult<()>;

    async fn disable_sparse_checkout(&self) -> ReposyncResult<()>;

    async fn submodule_foreach(&self, command: &str, recursive: bool) -> ReposyncResult<String>;

    async fn submodule_sync(&self, recursive: bool) -> ReposyncResult<()>;

    async fn submodule_update(&self, fetch_depth: u32, recursive: bool) -> ReposyncResult<()>;

    async fn submodule_status(&self) -> ReposyncResult<bool>;

    async fn tag_exists(&self, pattern: &str) -> ReposyncResult<bool>;

    async fn try_clean(&self) -> ReposyncResult<bool>;

    async fn try_config_unset(&self, key: &str, global: bool) -> ReposyncResult<bool>;

    async fn try_disable_automatic_garbage_collection(&self) -> ReposyncResult<bool>;

    /// `remote.origin.url`, or an empty string when unset or ambiguous.
    async fn try_get_fetch_url(&self) -> ReposyncResult<String>;

    async fn try_reset(&self) -> ReposyncResult<bool>;
}

/// Production [`GitCommands`] implementation running the git executable.
pub struct GitCommandManager {
    executable: PathBuf,
    working_directory: PathBuf,
    lfs: bool,
    version: GitVersion,
    environment: RwLock<HashMap<String, String>>,
    retry: RetryExecutor,
}

impl GitCommandManager {
    /// Locate git, verify its version and prepare the environment overlay.
    pub async fn create(
        working_directory: impl Into<PathBuf>,
        options: GitManagerOptions,
    ) -> ReposyncResult<Self> {
        let mut manager = Self {
            executable: options.executable,
            working_directory: working_directory.into(),
            lfs: options.lfs,
            version: MINIMUM_GIT_VERSION,
            environment: RwLock::new(HashMap::new()),
            retry: RetryExecutor::new(options.retry),
        };
        manager.initialize(options.sparse_checkout).await?;
        Ok(manager)
    }

    async fn initialize(&mut self, sparse_checkout: bool) -> ReposyncResult<()> {
        let executable = self.executable.display().to_string();

        let output = self.exec_git(&args(&["version"]), false).await?;
        let version = GitVersion::from_version_output(&output.stdout)
            .map_err(|_| ReposyncError::tool_unavailable("Unable to determine git version", &executable))?;
        if !version.check_minimum(&MINIMUM_GIT_VERSION) {
            return Err(ReposyncError::tool_unavailable(
                format!(
                    "Minimum required git version is {}. Your git ('{}') is {}",
                    MINIMUM_GIT_VERSION, executable, version
                ),
                &executable,
            ));
        }
        self.version = version;

        if self.lfs {
            let output = self.exec_git(&args(&["lfs", "version"]), true).await?;
            if !output.success() {
                return Err(ReposyncError::tool_unavailable(
                    "git-lfs is not installed",
                    "git-lfs",
                ));
            }
            let lfs_version = GitVersion::from_version_output(&output.stdout).map_err(|_| {
                ReposyncError::tool_unavailable("Unable to determine git-lfs version", "git-lfs")
            })?;
            if !lfs_version.check_minimum(&MINIMUM_GIT_LFS_VERSION) {
                return Err(ReposyncError::tool_unavailable(
                    format!(
                        "Minimum required git-lfs version is {}. Your git-lfs is {}",
                        MINIMUM_GIT_LFS_VERSION, lfs_version
                    ),
                    "git-lfs",
                ));
            }
        }

        if sparse_checkout && !version.check_minimum(&MINIMUM_GIT_SPARSE_CHECKOUT_VERSION) {
            return Err(ReposyncError::tool_unavailable(
                format!(
                    "Minimum git version required for sparse checkout is {}. Your git ('{}') is {}",
                    MINIMUM_GIT_SPARSE_CHECKOUT_VERSION, executable, version
                ),
                &executable,
            ));
        }

        let mut environment = self.environment.write().unwrap_or_else(PoisonError::into_inner);
        environment.insert(
            "GIT_HTTP_USER_AGENT".to_string(),
            format!("git/{} (reposync)", version),
        );
        environment.insert("GIT_TERMINAL_PROMPT".to_string(), "0".to_string());
        environment.insert("GCM_INTERACTIVE".to_string(), "Never".to_string());
        if !self.lfs {
            environment.insert("GIT_LFS_SKIP_SMUDGE".to_string(), "1".to_string());
        }

        Ok(())
    }

    fn execution_config(&self) -> ExecutionConfig {
        let environment = self
            .environment
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        ExecutionConfig::new()
            .with_working_directory(&self.working_directory)
            .with_environment_variables(environment)
    }

    async fn exec_git(&self, args: &[String], allow_all_exit_codes: bool) -> ReposyncResult<GitOutput> {
        self.exec_git_with_listener(args, allow_all_exit_codes, &mut |_| {})
            .await
    }

    async fn exec_git_with_listener(
        &self,
        args: &[String],
        allow_all_exit_codes: bool,
        on_line: &mut (dyn FnMut(&str) + Send),
    ) -> ReposyncResult<GitOutput> {
        let config = self.execution_config();
        let result =
            CommandExecutor::execute_with_listener(&self.executable, args, &config, on_line).await?;

        if !result.success && !allow_all_exit_codes {
            return Err(ReposyncError::command_error(
                format!("{} {}", self.executable.display(), args.join(" ")),
                result.exit_code,
                result.stderr.trim(),
            ));
        }

        Ok(GitOutput {
            exit_code: result.exit_code,
            stdout: result.stdout,
        })
    }

    /// Runs a network-bound command through the retry policy.
    async fn exec_git_retried(&self, args: &[String]) -> ReposyncResult<GitOutput> {
        self.retry.execute(move || self.exec_git(args, false)).await
    }

    fn scope_flag(global: bool) -> &'static str {
        if global {
            "--global"
        } else {
            "--local"
        }
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Escape a config key for use as a `--get-regexp` pattern.
pub(crate) fn regex_escape_config_key(key: &str) -> String {
    regex::escape(key)
}

#[async_trait]
impl GitCommands for GitCommandManager {
    fn version(&self) -> GitVersion {
        self.version
    }

    fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    fn set_environment_variable(&self, name: &str, value: &str) {
        self.environment
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    fn remove_environment_variable(&self, name: &str) {
        self.environment
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    async fn branch_delete(&self, remote: bool, branch: &str) -> ReposyncResult<()> {
        let mut command = args(&["branch", "--delete", "--force"]);
        if remote {
            command.push("--remote".to_string());
        }
        command.push(branch.to_string());
        self.exec_git(&command, false).await?;
        Ok(())
    }

    async fn branch_exists(&self, remote: bool, pattern: &str) -> ReposyncResult<bool> {
        let mut command = args(&["branch", "--list"]);
        if remote {
            command.push("--remote".to_string());
        }
        command.push(pattern.to_string());
        let output = self.exec_git(&command, false).await?;
        Ok(!output.stdout.trim().is_empty())
    }

    async fn branch_list(&self, remote: bool) -> ReposyncResult<Vec<String>> {
        // `git branch` output is meant for humans; rev-parse gives stable names
        let mut command = args(&["rev-parse", "--symbolic-full-name"]);
        if remote {
            command.push("--remotes=origin".to_string());
        } else {
            command.push("--branches".to_string());
        }

        let mut branches = Vec::new();
        self.exec_git_with_listener(&command, false, &mut |line| {
            let line = line.trim();
            if line.is_empty() {
                return;
            }
            if let Some(name) = line.strip_prefix("refs/heads/") {
                branches.push(name.to_string());
            } else if let Some(name) = line.strip_prefix("refs/remotes/") {
                branches.push(name.to_string());
            }
        })
        .await?;

        Ok(branches)
    }

    async fn checkout(&self, reference: &str, start_point: Option<&str>) -> ReposyncResult<()> {
        let mut command = args(&["checkout", "--progress", "--force"]);
        match start_point {
            Some(start) => {
                command.extend(args(&["-B", reference, start]));
            }
            None => command.push(reference.to_string()),
        }
        self.exec_git(&command, false).await?;
        Ok(())
    }

    async fn checkout_detach(&self) -> ReposyncResult<()> {
        self.exec_git(&args(&["checkout", "--detach"]), false).await?;
        Ok(())
    }

    async fn config(&self, key: &str, value: &str, global: bool, add: bool) -> ReposyncResult<()> {
        let mut command = args(&["config", Self::scope_flag(global)]);
        if add {
            command.push("--add".to_string());
        }
        command.extend(args(&[key, value]));
        self.exec_git(&command, false).await?;
        Ok(())
    }

    async fn config_exists(&self, key: &str, global: bool) -> ReposyncResult<bool> {
        let pattern = regex_escape_config_key(key);
        let output = self
            .exec_git(
                &args(&[
                    "config",
                    Self::scope_flag(global),
                    "--name-only",
                    "--get-regexp",
                    &pattern,
                ]),
                true,
            )
            .await?;
        Ok(output.success())
    }

    async fn fetch(&self, refspecs: &[String], options: &FetchOptions) -> ReposyncResult<()> {
        let mut command = args(&["-c", "protocol.version=2", "fetch"]);
        if !refspecs.iter().any(|spec| spec == TAGS_REFSPEC) && !options.fetch_tags {
            command.push("--no-tags".to_string());
        }
        command.extend(args(&["--prune", "--no-recurse-submodules"]));
        if options.show_progress {
            command.push("--progress".to_string());
        }
        if let Some(filter) = &options.filter {
            command.push(format!("--filter={}", filter));
        }
        if options.fetch_depth > 0 {
            command.push(format!("--depth={}", options.fetch_depth));
        } else if self.working_directory.join(".git").join("shallow").exists() {
            command.push("--unshallow".to_string());
        }
        command.push("origin".to_string());
        command.extend(refspecs.iter().cloned());

        self.exec_git_retried(&command).await?;
        Ok(())
    }

    async fn default_branch(&self, repository_url: &str) -> ReposyncResult<String> {
        info!("Retrieving the default branch name");
        let command = args(&[
            "ls-remote",
            "--quiet",
            "--exit-code",
            "--symref",
            repository_url,
            "HEAD",
        ]);
        let output = self.exec_git_retried(&command).await?;

        for line in output.stdout.trim().lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("ref:") {
                if let Some(reference) = rest.strip_suffix("HEAD") {
                    let reference = reference.trim();
                    info!(default_branch = %reference, "Default branch resolved");
                    return Ok(reference.to_string());
                }
            }
        }

        Err(ReposyncError::internal_error(
            "Unexpected output when retrieving default branch",
        ))
    }

    async fn init(&self) -> ReposyncResult<()> {
        self.exec_git(&args(&["init", &self.working_directory.display().to_string()]), false)
            .await?;
        Ok(())
    }

    async fn is_detached(&self) -> ReposyncResult<bool> {
        // Note, "branch --show-current" would be simpler but requires git 2.22
        let output = self
            .exec_git(
                &args(&["rev-parse", "--symbolic-full-name", "--verify", "--quiet", "HEAD"]),
                true,
            )
            .await?;
        Ok(!output.stdout.trim().starts_with("refs/heads/"))
    }

    async fn lfs_fetch(&self, reference: &str) -> ReposyncResult<()> {
        let command = args(&["lfs", "fetch", "origin", reference]);
        self.exec_git_retried(&command).await?;
        Ok(())
    }

    async fn lfs_install(&self) -> ReposyncResult<()> {
        self.exec_git(&args(&["lfs", "install", "--local"]), false)
            .await?;
        Ok(())
    }

    async fn log1(&self, format: Option<&str>) -> ReposyncResult<String> {
        let mut command = args(&["log", "-1"]);
        if let Some(format) = format {
            command.push(format.to_string());
        }
        let output = self.exec_git(&command, false).await?;
        Ok(output.stdout)
    }

    async fn remote_add(&self, name: &str, url: &str) -> ReposyncResult<()> {
        self.exec_git(&args(&["remote", "add", name, url]), false)
            .await?;
        Ok(())
    }

    async fn rev_parse(&self, reference: &str) -> ReposyncResult<String> {
        let output = self.exec_git(&args(&["rev-parse", reference]), false).await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn sha_exists(&self, sha: &str) -> ReposyncResult<bool> {
        let object = format!("{}^{{object}}", sha);
        let output = self
            .exec_git(&args(&["rev-parse", "--verify", "--quiet", &object]), true)
            .await?;
        Ok(output.success())
    }

    async fn sparse_checkout(&self, patterns: &[String]) -> ReposyncResult<()> {
        let mut command = args(&["sparse-checkout", "set"]);
        command.extend(patterns.iter().cloned());
        self.exec_git(&command, false).await?;
        Ok(())
    }

    async fn sparse_checkout_non_cone_mode(&self, patterns: &[String]) -> ReposyncResult<()> {
        self.exec_git(&args(&["config", "core.sparseCheckout", "true"]), false)
            .await?;

        let output = self
            .exec_git(&args(&["rev-parse", "--git-path", "info/sparse-checkout"]), false)
            .await?;
        let sparse_file = self.working_directory.join(output.stdout.trim());
        if let Some(parent) = sparse_file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ReposyncError::filesystem_error_with_source(
                    "Failed to create sparse-checkout directory",
                    Some(parent.to_path_buf()),
                    e,
                )
            })?;
        }

        let mut contents = tokio::fs::read_to_string(&sparse_file)
            .await
            .unwrap_or_default();
        contents.push('\n');
        contents.push_str(&patterns.join("\n"));
        contents.push('\n');
        tokio::fs::write(&sparse_file, contents).await.map_err(|e| {
            ReposyncError::filesystem_error_with_source(
                "Failed to write sparse-checkout file",
                Some(sparse_file.clone()),
                e,
            )
        })?;
        Ok(())
    }

    async fn disable_sparse_checkout(&self) -> ReposyncResult<()> {
        self.exec_git(&args(&["sparse-checkout", "disable"]), false)
            .await?;
        // `sparse-checkout disable` enables worktreeConfig, which breaks older
        // git versions reusing this directory
        self.try_config_unset("extensions.worktreeConfig", false)
            .await?;
        Ok(())
    }

    async fn submodule_foreach(&self, command: &str, recursive: bool) -> ReposyncResult<String> {
        let mut full = args(&["submodule", "foreach"]);
        if recursive {
            full.push("--recursive".to_string());
        }
        full.push(command.to_string());
        let output = self.exec_git(&full, false).await?;
        Ok(output.stdout)
    }

    async fn submodule_sync(&self, recursive: bool) -> ReposyncResult<()> {
        let mut command = args(&["submodule", "sync"]);
        if recursive {
            command.push("--recursive".to_string());
        }
        self.exec_git(&command, false).await?;
        Ok(())
    }

    async fn submodule_update(&self, fetch_depth: u32, recursive: bool) -> ReposyncResult<()> {
        let mut command = args(&[
            "-c",
            "protocol.version=2",
            "submodule",
            "update",
            "--init",
            "--force",
        ]);
        if fetch_depth > 0 {
            command.push(format!("--depth={}", fetch_depth));
        }
        if recursive {
            command.push("--recursive".to_string());
        }
        self.exec_git(&command, false).await?;
        Ok(())
    }

    async fn submodule_status(&self) -> ReposyncResult<bool> {
        let output = self.exec_git(&args(&["submodule", "status"]), true).await?;
        debug!(stdout = %output.stdout.trim(), "submodule status");
        Ok(output.success())
    }

    async fn tag_exists(&self, pattern: &str) -> ReposyncResult<bool> {
        let output = self.exec_git(&args(&["tag", "--list", pattern]), false).await?;
        Ok(!output.stdout.trim().is_empty())
    }

    async fn try_clean(&self) -> ReposyncResult<bool> {
        let output = self.exec_git(&args(&["clean", "-ffdx"]), true).await?;
        Ok(output.success())
    }

    async fn try_config_unset(&self, key: &str, global: bool) -> ReposyncResult<bool> {
        let output = self
            .exec_git(
                &args(&["config", Self::scope_flag(global), "--unset-all", key]),
                true,
            )
            .await?;
        Ok(output.success())
    }

    async fn try_disable_automatic_garbage_collection(&self) -> ReposyncResult<bool> {
        let output = self
            .exec_git(&args(&["config", "--local", "gc.auto", "0"]), true)
            .await?;
        Ok(output.success())
    }

    async fn try_get_fetch_url(&self) -> ReposyncResult<String> {
        let output = self
            .exec_git(&args(&["config", "--local", "--get", "remote.origin.url"]), true)
            .await?;
        if !output.success() {
            return Ok(String::new());
        }

        let stdout = output.stdout.trim();
        if stdout.contains('\n') {
            return Ok(String::new());
        }
        Ok(stdout.to_string())
    }

    async fn try_reset(&self) -> ReposyncResult<bool> {
        let output = self
            .exec_git(&args(&["reset", "--hard", "HEAD"]), true)
            .await?;
        Ok(output.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager(dir: &Path) -> GitCommandManager {
        GitCommandManager::create(dir, GitManagerOptions::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_regex_escape_config_key() {
        assert_eq!(
            regex_escape_config_key("http.https://github.com/.extraheader"),
            r"http\.https://github\.com/\.extraheader"
        );
    }

    #[tokio::test]
    async fn test_create_sets_environment_overlay() {
        let temp = TempDir::new().unwrap();
        let git = manager(temp.path()).await;

        assert!(git.version().check_minimum(&MINIMUM_GIT_VERSION));
        let env = git.execution_config().environment_variables;
        assert_eq!(env.get("GIT_TERMINAL_PROMPT").map(String::as_str), Some("0"));
        assert_eq!(env.get("GCM_INTERACTIVE").map(String::as_str), Some("Never"));
        assert_eq!(env.get("GIT_LFS_SKIP_SMUDGE").map(String::as_str), Some("1"));
        assert!(env["GIT_HTTP_USER_AGENT"].ends_with("(reposync)"));
    }

    #[tokio::test]
    async fn test_missing_executable_is_tool_unavailable() {
        let temp = TempDir::new().unwrap();
        let options = GitManagerOptions {
            executable: PathBuf::from("/nonexistent/git"),
            ..GitManagerOptions::default()
        };

        let result = GitCommandManager::create(temp.path(), options).await;
        assert!(matches!(result, Err(ReposyncError::ToolUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_environment_overlay_reaches_git() {
        let temp = TempDir::new().unwrap();
        let git = manager(temp.path()).await;
        git.init().await.unwrap();

        git.set_environment_variable("GIT_CONFIG_PARAMETERS", "'reposync.marker=yes'");
        let output = git
            .exec_git(&args(&["config", "--get", "reposync.marker"]), false)
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "yes");

        git.remove_environment_variable("GIT_CONFIG_PARAMETERS");
        let output = git
            .exec_git(&args(&["config", "--get", "reposync.marker"]), true)
            .await
            .unwrap();
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let temp = TempDir::new().unwrap();
        let git = manager(temp.path()).await;
        git.init().await.unwrap();

        assert!(!git.config_exists("reposync.key", false).await.unwrap());
        git.config("reposync.key", "value", false, false).await.unwrap();
        assert!(git.config_exists("reposync.key", false).await.unwrap());
        assert!(git.try_config_unset("reposync.key", false).await.unwrap());
        assert!(!git.try_config_unset("reposync.key", false).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_url_empty_without_remote() {
        let temp = TempDir::new().unwrap();
        let git = manager(temp.path()).await;
        git.init().await.unwrap();

        assert_eq!(git.try_get_fetch_url().await.unwrap(), "");
        git.remote_add("origin", "https://example.com/a/b").await.unwrap();
        assert_eq!(git.try_get_fetch_url().await.unwrap(), "https://example.com/a/b");
    }

    #[tokio::test]
    async fn test_failed_command_carries_stderr() {
        let temp = TempDir::new().unwrap();
        let git = manager(temp.path()).await;
        git.init().await.unwrap();

        let err = git.rev_parse("refs/heads/does-not-exist").await.unwrap_err();
        match err {
            ReposyncError::CommandError { command, exit_code, .. } => {
                assert!(command.contains("rev-parse"));
                assert_ne!(exit_code, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
