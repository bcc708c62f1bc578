//! Recording in-memory [`GitCommands`] used by unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;
use crate::domain::value_objects::git_version::GitVersion;
use crate::infrastructure::git::command_manager::{FetchOptions, GitCommands};

#[derive(Debug)]
pub struct FakeGitState {
    pub calls: Vec<String>,
    pub local_branches: Vec<String>,
    /// `origin/<name>` entries
    pub remote_branches: Vec<String>,
    pub tags: Vec<String>,
    pub revisions: HashMap<String, String>,
    pub known_shas: Vec<String>,
    pub detached: bool,
    pub fetch_url: String,
    pub default_branch: String,
    pub submodule_status_ok: bool,
    pub clean_ok: bool,
    pub reset_ok: bool,
    pub local_config: HashMap<String, Vec<String>>,
    pub global_config: HashMap<String, Vec<String>>,
    pub environment: HashMap<String, String>,
    pub foreach_output: String,
    /// Operation names that fail with a command error
    pub failing: Vec<String>,
}

impl Default for FakeGitState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            local_branches: Vec::new(),
            remote_branches: Vec::new(),
            tags: Vec::new(),
            revisions: HashMap::new(),
            known_shas: Vec::new(),
            detached: false,
            fetch_url: String::new(),
            default_branch: "refs/heads/main".to_string(),
            submodule_status_ok: true,
            clean_ok: true,
            reset_ok: true,
            local_config: HashMap::new(),
            global_config: HashMap::new(),
            environment: HashMap::new(),
            foreach_output: String::new(),
            failing: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct FakeGit {
    pub state: Arc<Mutex<FakeGitState>>,
    working_directory: PathBuf,
}

impl FakeGit {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeGitState::default())),
            working_directory: working_directory.into(),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeGitState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn record(&self, operation: &str, call: String) -> ReposyncResult<MutexGuard<'_, FakeGitState>> {
        let mut state = self.state();
        state.calls.push(call.clone());
        if state.failing.iter().any(|f| f == operation) {
            return Err(ReposyncError::command_error(call, 1, "fake failure"));
        }
        Ok(state)
    }

    fn config_map<'a>(
        state: &'a mut FakeGitState,
        global: bool,
    ) -> &'a mut HashMap<String, Vec<String>> {
        if global {
            &mut state.global_config
        } else {
            &mut state.local_config
        }
    }
}

#[async_trait]
impl GitCommands for FakeGit {
    fn version(&self) -> GitVersion {
        GitVersion::new(2, 39, Some(5))
    }

    fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    fn set_environment_variable(&self, name: &str, value: &str) {
        self.state()
            .environment
            .insert(name.to_string(), value.to_string());
    }

    fn remove_environment_variable(&self, name: &str) {
        self.state().environment.remove(name);
    }

    async fn branch_delete(&self, remote: bool, branch: &str) -> ReposyncResult<()> {
        let mut state = self.record("branch_delete", format!("branch_delete {} {}", remote, branch))?;
        if remote {
            state.remote_branches.retain(|b| b != branch);
        } else {
            state.local_branches.retain(|b| b != branch);
        }
        Ok(())
    }

    async fn branch_exists(&self, remote: bool, pattern: &str) -> ReposyncResult<bool> {
        let state = self.record("branch_exists", format!("branch_exists {} {}", remote, pattern))?;
        let branches = if remote {
            &state.remote_branches
        } else {
            &state.local_branches
        };
        Ok(branches.iter().any(|b| b == pattern))
    }

    async fn branch_list(&self, remote: bool) -> ReposyncResult<Vec<String>> {
        let state = self.record("branch_list", format!("branch_list {}", remote))?;
        Ok(if remote {
            state.remote_branches.clone()
        } else {
            state.local_branches.clone()
        })
    }

    async fn checkout(&self, reference: &str, start_point: Option<&str>) -> ReposyncResult<()> {
        self.record(
            "checkout",
            format!("checkout {} {}", reference, start_point.unwrap_or("-")),
        )?;
        Ok(())
    }

    async fn checkout_detach(&self) -> ReposyncResult<()> {
        let mut state = self.record("checkout_detach", "checkout_detach".to_string())?;
        state.detached = true;
        Ok(())
    }

    async fn config(&self, key: &str, value: &str, global: bool, add: bool) -> ReposyncResult<()> {
        let mut state = self.record("config", format!("config {} {} {}", global, key, value))?;
        let map = Self::config_map(&mut state, global);
        let values = map.entry(key.to_string()).or_default();
        if !add {
            values.clear();
        }
        values.push(value.to_string());
        Ok(())
    }

    async fn config_exists(&self, key: &str, global: bool) -> ReposyncResult<bool> {
        let mut state = self.record("config_exists", format!("config_exists {} {}", global, key))?;
        Ok(Self::config_map(&mut state, global).contains_key(key))
    }

    async fn fetch(&self, refspecs: &[String], options: &FetchOptions) -> ReposyncResult<()> {
        self.record(
            "fetch",
            format!("fetch depth={} {}", options.fetch_depth, refspecs.join(" ")),
        )?;
        Ok(())
    }

    async fn default_branch(&self, repository_url: &str) -> ReposyncResult<String> {
        let state = self.record("default_branch", format!("default_branch {}", repository_url))?;
        Ok(state.default_branch.clone())
    }

    async fn init(&self) -> ReposyncResult<()> {
        self.record("init", "init".to_string())?;
        Ok(())
    }

    async fn is_detached(&self) -> ReposyncResult<bool> {
        let state = self.record("is_detached", "is_detached".to_string())?;
        Ok(state.detached)
    }

    async fn lfs_fetch(&self, reference: &str) -> ReposyncResult<()> {
        self.record("lfs_fetch", format!("lfs_fetch {}", reference))?;
        Ok(())
    }

    async fn lfs_install(&self) -> ReposyncResult<()> {
        self.record("lfs_install", "lfs_install".to_string())?;
        Ok(())
    }

    async fn log1(&self, format: Option<&str>) -> ReposyncResult<String> {
        self.record("log1", format!("log1 {}", format.unwrap_or("-")))?;
        Ok("0000000000000000000000000000000000000000\n".to_string())
    }

    async fn remote_add(&self, name: &str, url: &str) -> ReposyncResult<()> {
        let mut state = self.record("remote_add", format!("remote_add {} {}", name, url))?;
        state.fetch_url = url.to_string();
        Ok(())
    }

    async fn rev_parse(&self, reference: &str) -> ReposyncResult<String> {
        let state = self.record("rev_parse", format!("rev_parse {}", reference))?;
        state.revisions.get(reference).cloned().ok_or_else(|| {
            ReposyncError::command_error(format!("git rev-parse {}", reference), 128, "unknown revision")
        })
    }

    async fn sha_exists(&self, sha: &str) -> ReposyncResult<bool> {
        let state = self.record("sha_exists", format!("sha_exists {}", sha))?;
        Ok(state.known_shas.iter().any(|s| s == sha))
    }

    async fn sparse_checkout(&self, patterns: &[String]) -> ReposyncResult<()> {
        self.record("sparse_checkout", format!("sparse_checkout {}", patterns.join(" ")))?;
        Ok(())
    }

    async fn sparse_checkout_non_cone_mode(&self, patterns: &[String]) -> ReposyncResult<()> {
        self.record(
            "sparse_checkout_non_cone_mode",
            format!("sparse_checkout_non_cone_mode {}", patterns.join(" ")),
        )?;
        Ok(())
    }

    async fn disable_sparse_checkout(&self) -> ReposyncResult<()> {
        self.record("disable_sparse_checkout", "disable_sparse_checkout".to_string())?;
        Ok(())
    }

    async fn submodule_foreach(&self, command: &str, recursive: bool) -> ReposyncResult<String> {
        let state = self.record(
            "submodule_foreach",
            format!("submodule_foreach {} {}", recursive, command),
        )?;
        Ok(state.foreach_output.clone())
    }

    async fn submodule_sync(&self, recursive: bool) -> ReposyncResult<()> {
        self.record("submodule_sync", format!("submodule_sync {}", recursive))?;
        Ok(())
    }

    async fn submodule_update(&self, fetch_depth: u32, recursive: bool) -> ReposyncResult<()> {
        self.record(
            "submodule_update",
            format!("submodule_update {} {}", fetch_depth, recursive),
        )?;
        Ok(())
    }

    async fn submodule_status(&self) -> ReposyncResult<bool> {
        let state = self.record("submodule_status", "submodule_status".to_string())?;
        Ok(state.submodule_status_ok)
    }

    async fn tag_exists(&self, pattern: &str) -> ReposyncResult<bool> {
        let state = self.record("tag_exists", format!("tag_exists {}", pattern))?;
        Ok(state.tags.iter().any(|t| t == pattern))
    }

    async fn try_clean(&self) -> ReposyncResult<bool> {
        let state = self.record("try_clean", "try_clean".to_string())?;
        Ok(state.clean_ok)
    }

    async fn try_config_unset(&self, key: &str, global: bool) -> ReposyncResult<bool> {
        let mut state = self.record(
            "try_config_unset",
            format!("try_config_unset {} {}", global, key),
        )?;
        Ok(Self::config_map(&mut state, global).remove(key).is_some())
    }

    async fn try_disable_automatic_garbage_collection(&self) -> ReposyncResult<bool> {
        self.record("try_disable_gc", "try_disable_gc".to_string())?;
        Ok(true)
    }

    async fn try_get_fetch_url(&self) -> ReposyncResult<String> {
        let state = self.record("try_get_fetch_url", "try_get_fetch_url".to_string())?;
        Ok(state.fetch_url.clone())
    }

    async fn try_reset(&self) -> ReposyncResult<bool> {
        let state = self.record("try_reset", "try_reset".to_string())?;
        Ok(state.reset_ok)
    }
}
