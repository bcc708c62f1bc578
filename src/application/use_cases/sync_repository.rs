use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::application::services::workspace_reconciler::WorkspaceReconciler;
use crate::common::error::ReposyncError;
use crate::common::result::{ReposyncResult, ResultExt};
use crate::common::retry::RetryExecutor;
use crate::domain::entities::sync_outcome::{CleanupState, SyncOutcome};
use crate::domain::entities::sync_settings::SyncSettings;
use crate::infrastructure::api::archive_fetcher::ArchiveFallbackFetcher;
use crate::infrastructure::api::repository_api::{HttpRepositoryApi, RepositoryApi};
use crate::infrastructure::filesystem::fs_helper;
use crate::infrastructure::git::auth_manager::AuthManager;
use crate::infrastructure::git::command_manager::{
    FetchOptions, GitCommandManager, GitCommands, GitManagerOptions,
    MINIMUM_GIT_SPARSE_CHECKOUT_VERSION,
};
use crate::infrastructure::git::ref_resolver;

/// リポジトリ同期のユースケース
///
/// 1回の `sync` は1つのワークスペースだけを扱い、プロセス全体の状態は持たない。
/// `cleanup` に必要な情報はすべて [`SyncOutcome`] で返す。
pub struct SyncOrchestrator {
    repository_api: Option<Arc<dyn RepositoryApi>>,
    reconciler: WorkspaceReconciler,
}

impl Default for SyncOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncOrchestrator {
    pub fn new() -> Self {
        Self {
            repository_api: None,
            reconciler: WorkspaceReconciler::new(),
        }
    }

    /// 既定のHTTP実装の代わりに使うAPIクライアントを指定
    pub fn with_repository_api(mut self, api: Arc<dyn RepositoryApi>) -> Self {
        self.repository_api = Some(api);
        self
    }

    fn repository_api(&self, settings: &SyncSettings) -> ReposyncResult<Arc<dyn RepositoryApi>> {
        match &self.repository_api {
            Some(api) => Ok(Arc::clone(api)),
            None => Ok(Arc::new(HttpRepositoryApi::new(
                &settings.server_url,
                settings.auth_token.clone(),
            )?)),
        }
    }

    /// リポジトリを `settings.repository_path` に同期する
    #[instrument(
        skip_all,
        fields(
            repository = %format!("{}/{}", settings.repository_owner, settings.repository_name),
            path = %settings.repository_path.display(),
        )
    )]
    pub async fn sync(&self, settings: &SyncSettings) -> ReposyncResult<SyncOutcome> {
        settings.validate()?;

        let repository_path = settings.repository_path.as_path();
        let repository_url = settings.fetch_url();
        info!(url = %repository_url, "Syncing repository");

        // Remove conflicting file path
        if fs_helper::file_exists(repository_path) {
            fs_helper::remove_path(repository_path).await?;
        }

        let is_existing = fs_helper::directory_exists(repository_path);
        if !is_existing {
            tokio::fs::create_dir_all(repository_path)
                .await
                .with_filesystem_error(
                    "Failed to create repository directory",
                    Some(repository_path.to_path_buf()),
                )?;
        }

        let Some(git) = create_runner(settings).await? else {
            return self
                .sync_from_archive(settings, is_existing, &repository_url)
                .await;
        };

        let mut outcome = SyncOutcome::new(repository_path, settings.server_url.clone());
        let mut auth = AuthManager::new(Arc::clone(&git), settings.clone());

        let result = self
            .sync_with_git(
                settings,
                git.as_ref(),
                &mut auth,
                &mut outcome,
                is_existing,
                &repository_url,
            )
            .await;

        // A failed sync leaves no state file behind, so nothing could clean up later
        if result.is_err() || !settings.persist_credentials {
            auth.remove_auth().await;
        }
        auth.remove_global_config().await;
        result?;

        if settings.persist_credentials {
            outcome.ssh_key_path = auth.session().ssh_key_path.clone();
            outcome.ssh_known_hosts_path = auth.session().ssh_known_hosts_path.clone();
        }

        info!(commit = outcome.commit.as_deref().unwrap_or_default(), "Sync completed");
        Ok(outcome)
    }

    async fn sync_with_git(
        &self,
        settings: &SyncSettings,
        git: &dyn GitCommands,
        auth: &mut AuthManager,
        outcome: &mut SyncOutcome,
        is_existing: bool,
        repository_url: &str,
    ) -> ReposyncResult<()> {
        let repository_path = settings.repository_path.as_path();

        if settings.set_safe_directory {
            auth.configure_temp_global_config().await?;
            info!("Adding repository directory to the temporary git global config as a safe directory");
            if let Err(e) = git
                .config("safe.directory", &path_string(repository_path), true, true)
                .await
            {
                info!("Failed to initialize safe directory with error: {}", e);
            }
            outcome.set_safe_directory = true;
        }

        if is_existing {
            self.reconciler
                .prepare(
                    Some(git),
                    repository_path,
                    repository_url,
                    settings.clean,
                    settings.reference.as_deref(),
                )
                .await?;
        }

        if !fs_helper::directory_exists(&repository_path.join(".git")) {
            info!("Initializing the repository");
            git.init().await?;
            git.remote_add("origin", repository_url).await?;
        }

        if !git.try_disable_automatic_garbage_collection().await? {
            warn!("Unable to turn off git automatic garbage collection. The git fetch operation may trigger garbage collection and cause a delay.");
        }

        info!("Setting up auth");
        auth.configure_auth().await?;

        let commit = settings.commit.as_deref().filter(|c| !c.is_empty());
        let reference = match settings.reference.clone().filter(|r| !r.is_empty()) {
            Some(reference) => Some(reference),
            None if commit.is_none() => {
                info!("Determining the default branch");
                Some(self.default_branch(settings, git, repository_url).await?)
            }
            None => None,
        };
        let reference = reference.as_deref();

        if settings.lfs {
            info!("Initializing git-lfs");
            git.lfs_install().await?;
        }

        info!("Fetching the repository");
        let filter = match &settings.filter {
            Some(filter) => Some(filter.clone()),
            None if settings.has_sparse_checkout() => Some("blob:none".to_string()),
            None => None,
        };
        if settings.fetch_depth == 0 {
            let options = FetchOptions {
                filter,
                fetch_depth: 0,
                fetch_tags: false,
                show_progress: settings.show_progress,
            };
            git.fetch(&ref_resolver::full_history_refspecs(reference, commit), &options)
                .await?;

            // The ref may have moved since the commit was chosen
            if !ref_resolver::verify_post_fetch_state(git, reference, commit).await? {
                debug!("Ref moved during full history fetch, fetching target again");
                git.fetch(&ref_resolver::refspecs(reference, commit)?, &options)
                    .await?;
                if !ref_resolver::verify_post_fetch_state(git, reference, commit).await? {
                    return Err(ReposyncError::race_condition(
                        format!(
                            "The ref no longer points at commit '{}'",
                            commit.unwrap_or_default()
                        ),
                        reference.unwrap_or_default(),
                    ));
                }
            }
        } else {
            let options = FetchOptions {
                filter,
                fetch_depth: settings.fetch_depth,
                fetch_tags: settings.fetch_tags,
                show_progress: settings.show_progress,
            };
            git.fetch(&ref_resolver::refspecs(reference, commit)?, &options)
                .await?;
        }

        info!("Determining the checkout info");
        let target = ref_resolver::resolve_checkout_target(git, reference, commit).await?;

        if settings.lfs && !settings.has_sparse_checkout() {
            info!("Fetching LFS objects");
            git.lfs_fetch(target.start_point().unwrap_or(target.reference()))
                .await?;
        }

        match &settings.sparse_checkout {
            Some(patterns) if !patterns.is_empty() => {
                info!("Setting up sparse checkout");
                if settings.sparse_checkout_cone_mode {
                    git.sparse_checkout(patterns).await?;
                } else {
                    git.sparse_checkout_non_cone_mode(patterns).await?;
                }
            }
            _ => {
                if git.version().check_minimum(&MINIMUM_GIT_SPARSE_CHECKOUT_VERSION) {
                    git.disable_sparse_checkout().await?;
                }
            }
        }

        info!(checkout = %target, "Checking out the ref");
        git.checkout(target.reference(), target.start_point()).await?;

        if settings.submodules.is_enabled() {
            let recursive = settings.submodules.is_recursive();
            info!("Setting up auth for fetching submodules");
            auth.configure_global_auth().await?;

            info!("Fetching submodules");
            git.submodule_sync(recursive).await?;
            git.submodule_update(settings.fetch_depth, recursive).await?;
            git.submodule_foreach("git config --local gc.auto 0", recursive)
                .await?;

            if settings.persist_credentials {
                info!("Persisting credentials for submodules");
                auth.configure_submodule_auth().await?;
            }
        }

        let sha = git.log1(Some("--format=%H")).await?;
        outcome.commit = Some(sha.trim().to_string());
        outcome.ref_name = reference.map(str::to_string);

        Ok(())
    }

    async fn default_branch(
        &self,
        settings: &SyncSettings,
        git: &dyn GitCommands,
        repository_url: &str,
    ) -> ReposyncResult<String> {
        let over_http = settings.server_url.as_str().starts_with("http");
        if settings.has_ssh_key() || !over_http {
            return git.default_branch(repository_url).await;
        }

        let fetcher = ArchiveFallbackFetcher::new(
            self.repository_api(settings)?,
            RetryExecutor::new(settings.retry),
        );
        fetcher
            .default_branch(&settings.repository_owner, &settings.repository_name)
            .await
    }

    async fn sync_from_archive(
        &self,
        settings: &SyncSettings,
        is_existing: bool,
        repository_url: &str,
    ) -> ReposyncResult<SyncOutcome> {
        if settings.submodules.is_enabled() {
            return Err(ReposyncError::incompatible_options(
                "Submodules are not supported when falling back to downloading an archive. To create a local git repository instead, add git to the PATH.",
            ));
        }
        if settings.has_ssh_key() {
            return Err(ReposyncError::incompatible_options(
                "An SSH key is not supported when falling back to downloading an archive. To create a local git repository instead, add git to the PATH.",
            ));
        }

        let repository_path = settings.repository_path.as_path();
        if is_existing {
            self.reconciler
                .prepare(
                    None,
                    repository_path,
                    repository_url,
                    settings.clean,
                    settings.reference.as_deref(),
                )
                .await?;
        }

        info!("The repository will be downloaded using the REST API");
        let fetcher = ArchiveFallbackFetcher::new(
            self.repository_api(settings)?,
            RetryExecutor::new(settings.retry),
        );
        let reference = fetcher
            .download(
                &settings.repository_owner,
                &settings.repository_name,
                settings.reference.as_deref(),
                settings.commit.as_deref(),
                repository_path,
            )
            .await?;

        let mut outcome = SyncOutcome::new(repository_path, settings.server_url.clone());
        outcome.used_archive_fallback = true;
        outcome.commit = settings.commit.clone().filter(|c| !c.is_empty());
        outcome.ref_name = Some(reference).filter(|r| !r.is_empty());
        Ok(outcome)
    }

    /// 以前の同期で残した認証情報を削除する
    ///
    /// `.git/config` が無い、またはgitが使えない場合は何もしない。
    #[instrument(skip_all, fields(path = %state.repository_path.display()))]
    pub async fn cleanup(&self, state: &CleanupState) -> ReposyncResult<()> {
        let repository_path = state.repository_path.as_path();
        if repository_path.as_os_str().is_empty()
            || !fs_helper::file_exists(&repository_path.join(".git").join("config"))
        {
            debug!("No git repository to clean up");
            return Ok(());
        }

        let git: Arc<dyn GitCommands> =
            match GitCommandManager::create(repository_path, GitManagerOptions::default()).await {
                Ok(git) => Arc::new(git) as Arc<dyn GitCommands>,
                Err(e) => {
                    debug!(error = %e, "git unavailable, skipping cleanup");
                    return Ok(());
                }
            };

        let settings = SyncSettings::new("", "", repository_path)
            .with_server_url(state.server_url.clone());
        let mut auth = AuthManager::new(Arc::clone(&git), settings);
        auth.restore_ssh_paths(
            state.ssh_key_path.clone(),
            state.ssh_known_hosts_path.clone(),
        );

        let result = async {
            if state.set_safe_directory {
                auth.configure_temp_global_config().await?;
                info!("Adding repository directory to the temporary git global config as a safe directory");
                if let Err(e) = git
                    .config("safe.directory", &path_string(repository_path), true, true)
                    .await
                {
                    info!("Failed to initialize safe directory with error: {}", e);
                }
            }
            auth.remove_auth().await;
            Ok::<(), ReposyncError>(())
        }
        .await;

        auth.remove_global_config().await;
        result
    }
}

/// gitを準備する。LFSを要求していなければ、使えないgitは `None` になる
async fn create_runner(settings: &SyncSettings) -> ReposyncResult<Option<Arc<dyn GitCommands>>> {
    info!(
        "Working directory is '{}'",
        settings.repository_path.display()
    );
    let options = GitManagerOptions {
        executable: settings.git_executable.clone(),
        lfs: settings.lfs,
        sparse_checkout: settings.has_sparse_checkout(),
        retry: settings.retry,
    };

    match GitCommandManager::create(&settings.repository_path, options).await {
        Ok(git) => Ok(Some(Arc::new(git) as Arc<dyn GitCommands>)),
        // Git is required for LFS
        Err(e @ ReposyncError::ToolUnavailable { .. }) if !settings.lfs => {
            warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}
