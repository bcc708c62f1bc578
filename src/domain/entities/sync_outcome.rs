use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::value_objects::server_url::ServerUrl;

/// 同期処理の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// チェックアウト先ディレクトリ
    pub repository_path: PathBuf,

    /// 認証設定のキーを決めるサーバーURL
    pub server_url: ServerUrl,

    /// チェックアウトされたコミットSHA（アーカイブ取得時は要求値）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    /// 解決済みのref
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,

    /// gitを使わずアーカイブから展開したか
    pub used_archive_fallback: bool,

    /// 一時グローバル設定に `safe.directory` を追加したか
    pub set_safe_directory: bool,

    /// 永続化されたSSH鍵ファイル
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_known_hosts_path: Option<PathBuf>,

    pub synced_at: DateTime<Utc>,
}

impl SyncOutcome {
    pub fn new(repository_path: impl Into<PathBuf>, server_url: ServerUrl) -> Self {
        Self {
            repository_path: repository_path.into(),
            server_url,
            commit: None,
            ref_name: None,
            used_archive_fallback: false,
            set_safe_directory: false,
            ssh_key_path: None,
            ssh_known_hosts_path: None,
            synced_at: Utc::now(),
        }
    }

    /// `cleanup` に渡す状態を取り出す
    pub fn cleanup_state(&self) -> CleanupState {
        CleanupState {
            repository_path: self.repository_path.clone(),
            server_url: self.server_url.clone(),
            set_safe_directory: self.set_safe_directory,
            ssh_key_path: self.ssh_key_path.clone(),
            ssh_known_hosts_path: self.ssh_known_hosts_path.clone(),
        }
    }
}

/// `cleanup` が必要とする状態
///
/// Produced by `sync` and handed back explicitly; nothing is kept in
/// process-wide state between the two calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupState {
    pub repository_path: PathBuf,

    #[serde(default)]
    pub server_url: ServerUrl,

    #[serde(default)]
    pub set_safe_directory: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_known_hosts_path: Option<PathBuf>,
}

impl CleanupState {
    pub fn new(repository_path: impl Into<PathBuf>) -> Self {
        Self {
            repository_path: repository_path.into(),
            server_url: ServerUrl::default(),
            set_safe_directory: false,
            ssh_key_path: None,
            ssh_known_hosts_path: None,
        }
    }
}

impl From<&SyncOutcome> for CleanupState {
    fn from(outcome: &SyncOutcome) -> Self {
        outcome.cleanup_state()
    }
}
