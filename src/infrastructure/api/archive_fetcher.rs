use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tar::Archive;
use tracing::info;
use uuid::Uuid;

use crate::common::result::{OptionExt, ReposyncResult, ResultExt};
use crate::common::retry::RetryExecutor;
use crate::infrastructure::api::repository_api::RepositoryApi;
use crate::infrastructure::filesystem::fs_helper;

/// Downloads a repository snapshot when no usable git is available.
pub struct ArchiveFallbackFetcher {
    api: Arc<dyn RepositoryApi>,
    retry: RetryExecutor,
}

impl ArchiveFallbackFetcher {
    pub fn new(api: Arc<dyn RepositoryApi>, retry: RetryExecutor) -> Self {
        Self { api, retry }
    }

    /// Resolve the default branch through the API, with retries.
    pub async fn default_branch(&self, owner: &str, repo: &str) -> ReposyncResult<String> {
        let api = &self.api;
        self.retry
            .execute(move || api.default_branch(owner, repo))
            .await
    }

    /// Download `commit` (or `reference`) and unpack it into `repository_path`.
    ///
    /// Returns the ref that was downloaded.
    pub async fn download(
        &self,
        owner: &str,
        repo: &str,
        reference: Option<&str>,
        commit: Option<&str>,
        repository_path: &Path,
    ) -> ReposyncResult<String> {
        let reference = match (reference.filter(|r| !r.is_empty()), commit.filter(|c| !c.is_empty())) {
            (None, None) => {
                info!("Determining the default branch");
                self.default_branch(owner, repo).await?
            }
            (reference, _) => reference.unwrap_or_default().to_string(),
        };
        let archive_ref = commit
            .filter(|c| !c.is_empty())
            .unwrap_or(reference.as_str())
            .to_string();

        let api = &self.api;
        let archive_ref_ref = archive_ref.as_str();
        let archive_data = self
            .retry
            .execute(move || {
                info!("Downloading the archive");
                api.download_archive(owner, repo, archive_ref_ref)
            })
            .await?;

        info!("Writing archive to disk");
        let unique_id = Uuid::new_v4().to_string();
        let archive_path = repository_path.join(format!("{}.tar.gz", unique_id));
        tokio::fs::write(&archive_path, &archive_data)
            .await
            .with_filesystem_error("Failed to write archive", Some(archive_path.clone()))?;
        drop(archive_data);

        info!("Extracting the archive");
        let extract_path = repository_path.join(&unique_id);
        tokio::fs::create_dir_all(&extract_path).await?;
        extract_tarball(archive_path.clone(), extract_path.clone()).await?;
        fs_helper::remove_path(&archive_path).await?;

        // The archive holds one top-level folder named after the short SHA
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&extract_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            entries.push(entry);
        }
        let archive_root = entries
            .pop()
            .filter(|_| entries.is_empty())
            .ok_or_internal_error("Expected exactly one directory inside archive")?;
        info!("Resolved version {}", archive_root.file_name().to_string_lossy());

        fs_helper::move_entries(&archive_root.path(), repository_path).await?;
        fs_helper::remove_path(&extract_path).await?;

        Ok(reference)
    }
}

async fn extract_tarball(archive_path: PathBuf, extract_path: PathBuf) -> ReposyncResult<()> {
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let file = std::fs::File::open(&archive_path)?;
        let mut archive = Archive::new(GzDecoder::new(file));
        archive.unpack(&extract_path)
    })
    .await
    .with_internal_error("Archive extraction task failed")?
    .with_filesystem_error("Failed to extract archive", None)
}
