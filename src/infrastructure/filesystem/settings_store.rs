use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use validator::Validate;

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;
use crate::common::retry::RetryPolicy;
use crate::domain::entities::sync_outcome::CleanupState;
use crate::domain::entities::sync_settings::{SubmoduleMode, SyncSettings};
use crate::domain::value_objects::server_url::ServerUrl;

/// Retry section of the settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: Option<u32>,

    #[validate(range(max = 3600))]
    pub min_seconds: Option<u64>,

    #[validate(range(max = 3600))]
    pub max_seconds: Option<u64>,
}

/// YAML settings file. Every field is optional; absent fields keep the
/// defaults of [`SyncSettings`]. Secrets are never read from this file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    /// `owner/name`
    #[validate(length(min = 3, max = 255))]
    pub repository: Option<String>,

    #[validate(url)]
    pub server_url: Option<String>,

    pub path: Option<PathBuf>,

    #[serde(rename = "ref")]
    #[validate(length(min = 1))]
    pub reference: Option<String>,

    #[validate(length(min = 1))]
    pub commit: Option<String>,

    pub fetch_depth: Option<u32>,
    pub fetch_tags: Option<bool>,
    pub show_progress: Option<bool>,
    pub filter: Option<String>,
    pub sparse_checkout: Option<Vec<String>>,
    pub sparse_checkout_cone_mode: Option<bool>,
    pub clean: Option<bool>,
    pub submodules: Option<SubmoduleMode>,
    pub lfs: Option<bool>,
    pub ssh_known_hosts: Option<String>,
    pub ssh_strict: Option<bool>,

    #[validate(length(min = 1))]
    pub ssh_user: Option<String>,

    pub persist_credentials: Option<bool>,
    pub organization_id: Option<String>,
    pub set_safe_directory: Option<bool>,
    pub git_executable: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,

    pub retry: Option<RetrySection>,
}

/// Split `owner/name` into its two parts.
pub fn parse_repository(repository: &str) -> ReposyncResult<(String, String)> {
    match repository.trim().split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(ReposyncError::config_error(format!(
            "Invalid repository '{}'. Expected format {{owner}}/{{repo}}.",
            repository
        ))),
    }
}

impl SettingsFile {
    /// Build settings from this file. `repository` and `path` act as fallbacks
    /// when the caller does not supply them.
    pub fn into_settings(
        self,
        repository: Option<&str>,
        path: Option<&Path>,
    ) -> ReposyncResult<SyncSettings> {
        let repository = repository
            .map(str::to_string)
            .or(self.repository.clone())
            .ok_or_else(|| ReposyncError::config_error("repository is required"))?;
        let (owner, name) = parse_repository(&repository)?;

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match &self.path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            },
        };

        let mut settings = SyncSettings::new(owner, name, path);
        self.apply(&mut settings)?;
        Ok(settings)
    }

    fn apply(self, settings: &mut SyncSettings) -> ReposyncResult<()> {
        if let Some(server_url) = self.server_url {
            settings.server_url = ServerUrl::new(&server_url).map_err(|e| {
                ReposyncError::config_error_with_source("Invalid server URL", e)
            })?;
        }
        settings.reference = self.reference.or(settings.reference.take());
        settings.commit = self.commit.or(settings.commit.take());
        if let Some(depth) = self.fetch_depth {
            settings.fetch_depth = depth;
        }
        if let Some(v) = self.fetch_tags {
            settings.fetch_tags = v;
        }
        if let Some(v) = self.show_progress {
            settings.show_progress = v;
        }
        settings.filter = self.filter.or(settings.filter.take());
        settings.sparse_checkout = self.sparse_checkout.or(settings.sparse_checkout.take());
        if let Some(v) = self.sparse_checkout_cone_mode {
            settings.sparse_checkout_cone_mode = v;
        }
        if let Some(v) = self.clean {
            settings.clean = v;
        }
        if let Some(v) = self.submodules {
            settings.submodules = v;
        }
        if let Some(v) = self.lfs {
            settings.lfs = v;
        }
        settings.ssh_known_hosts = self.ssh_known_hosts.or(settings.ssh_known_hosts.take());
        if let Some(v) = self.ssh_strict {
            settings.ssh_strict = v;
        }
        if let Some(v) = self.ssh_user {
            settings.ssh_user = v;
        }
        if let Some(v) = self.persist_credentials {
            settings.persist_credentials = v;
        }
        settings.workflow_organization_id = self
            .organization_id
            .or(settings.workflow_organization_id.take());
        if let Some(v) = self.set_safe_directory {
            settings.set_safe_directory = v;
        }
        if let Some(v) = self.git_executable {
            settings.git_executable = v;
        }
        if let Some(v) = self.temp_dir {
            settings.temp_dir = v;
        }
        if let Some(retry) = self.retry {
            let defaults = settings.retry;
            settings.retry = RetryPolicy::new(
                retry.max_attempts.unwrap_or(defaults.max_attempts()),
                retry.min_seconds.unwrap_or(defaults.min_seconds()),
                retry.max_seconds.unwrap_or(defaults.max_seconds()),
            )?;
        }
        Ok(())
    }
}

/// Reads the YAML settings file and the JSON cleanup state file.
pub struct SettingsStore;

impl SettingsStore {
    pub async fn read_settings_file(path: &Path) -> ReposyncResult<SettingsFile> {
        let contents = async_fs::read_to_string(path).await.map_err(|e| {
            ReposyncError::config_error_with_source(
                format!("Failed to read settings file '{}'", path.display()),
                e,
            )
        })?;
        let file: SettingsFile = serde_yaml::from_str(&contents)?;
        file.validate()?;
        if let Some(retry) = &file.retry {
            retry.validate()?;
        }
        Ok(file)
    }

    pub async fn write_cleanup_state(path: &Path, state: &CleanupState) -> ReposyncResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(state)?;
        async_fs::write(path, json).await.map_err(|e| {
            ReposyncError::filesystem_error_with_source(
                "Failed to write state file",
                Some(path.to_path_buf()),
                e,
            )
        })
    }

    pub async fn read_cleanup_state(path: &Path) -> ReposyncResult<CleanupState> {
        let contents = async_fs::read_to_string(path).await.map_err(|e| {
            ReposyncError::filesystem_error_with_source(
                "Failed to read state file",
                Some(path.to_path_buf()),
                e,
            )
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
