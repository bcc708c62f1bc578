use std::path::Path;
use tracing::{debug, info, warn};

use crate::common::result::ReposyncResult;
use crate::infrastructure::filesystem::fs_helper;
use crate::infrastructure::git::command_manager::GitCommands;

/// 既存ワークスペースに対する判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// 既存の `.git` をそのまま再利用
    Reused,
    /// ディレクトリの中身を削除した
    Recreated,
}

/// 既存のチェックアウト先を再利用できるか判定し、必要なら中身を削除するサービス
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkspaceReconciler;

impl WorkspaceReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 既存ディレクトリを準備する
    ///
    /// `git` が `None`、`.git` が無い、またはフェッチURLが異なる場合は中身を削除する。
    /// それ以外は再利用を試み、途中の失敗はすべて削除に切り替える。
    /// ディレクトリ自体は削除しない（カレントディレクトリの可能性があるため）。
    pub async fn prepare(
        &self,
        git: Option<&dyn GitCommands>,
        repository_path: &Path,
        repository_url: &str,
        clean: bool,
        reference: Option<&str>,
    ) -> ReposyncResult<ReconcileDecision> {
        let remove = match git {
            None => true,
            Some(git) => {
                if !repository_path.join(".git").is_dir()
                    || git.try_get_fetch_url().await.unwrap_or_default() != repository_url
                {
                    true
                } else {
                    self.try_reuse(git, repository_path, clean, reference).await
                }
            }
        };

        if !remove {
            return Ok(ReconcileDecision::Reused);
        }

        info!("Deleting the contents of '{}'", repository_path.display());
        fs_helper::remove_directory_contents(repository_path).await?;
        Ok(ReconcileDecision::Recreated)
    }

    /// 再利用のための後片付け。削除が必要なら `true`
    async fn try_reuse(
        &self,
        git: &dyn GitCommands,
        repository_path: &Path,
        clean: bool,
        reference: Option<&str>,
    ) -> bool {
        // Left behind by a canceled run or crashed git process
        for lock in ["index.lock", "shallow.lock"] {
            let lock_path = repository_path.join(".git").join(lock);
            if let Err(e) = fs_helper::remove_path(&lock_path).await {
                debug!("Unable to delete '{}'. {}", lock_path.display(), e);
            }
        }

        match self.reset_refs_and_clean(git, clean, reference).await {
            Ok(remove) => remove,
            Err(e) => {
                debug!(error = %e, "prepare failed");
                warn!("Unable to prepare the existing repository. The repository will be recreated instead.");
                true
            }
        }
    }

    async fn reset_refs_and_clean(
        &self,
        git: &dyn GitCommands,
        clean: bool,
        reference: Option<&str>,
    ) -> ReposyncResult<bool> {
        info!("Removing previously created refs, to avoid conflicts");
        if !git.is_detached().await? {
            git.checkout_detach().await?;
        }

        for branch in git.branch_list(false).await? {
            git.branch_delete(false, &branch).await?;
        }

        // refs/heads/foo conflicts with a fetched refs/remotes/origin/foo/bar,
        // and refs/heads/foo/bar with refs/remotes/origin/foo
        if let Some(reference) = reference.filter(|r| !r.is_empty()) {
            let reference = if reference.starts_with("refs/") {
                reference.to_string()
            } else {
                format!("refs/heads/{}", reference)
            };

            if let Some(name) = reference.strip_prefix("refs/heads/") {
                let upper_name = name.to_uppercase();
                let upper_name_slash = format!("{}/", upper_name);
                for branch in git.branch_list(true).await? {
                    let other = branch
                        .strip_prefix("origin/")
                        .unwrap_or(&branch)
                        .to_uppercase();
                    let other_slash = format!("{}/", other);
                    if upper_name.starts_with(&other_slash) || other.starts_with(&upper_name_slash)
                    {
                        git.branch_delete(true, &branch).await?;
                    }
                }
            }
        }

        let mut remove = false;
        if !git.submodule_status().await? {
            remove = true;
            info!("Bad Submodules found, removing existing files");
        }

        if clean {
            info!("Cleaning the repository");
            if !git.try_clean().await? {
                debug!("The clean command failed. This might be caused by: 1) path too long, 2) permission issue, or 3) file in use.");
                remove = true;
            } else if !git.try_reset().await? {
                remove = true;
            }

            if remove {
                warn!("Unable to clean or reset the repository. The repository will be recreated instead.");
            }
        }

        Ok(remove)
    }
}
