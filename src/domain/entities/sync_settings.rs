use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;
use crate::common::retry::RetryPolicy;
use crate::domain::value_objects::secret::Secret;
use crate::domain::value_objects::server_url::ServerUrl;

/// サブモジュールの取得方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmoduleMode {
    /// サブモジュールを取得しない
    #[default]
    None,
    /// 直下のサブモジュールのみ
    Shallow,
    /// 再帰的に取得
    Recursive,
}

impl SubmoduleMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SubmoduleMode::None)
    }

    pub fn is_recursive(&self) -> bool {
        matches!(self, SubmoduleMode::Recursive)
    }
}

impl FromStr for SubmoduleMode {
    type Err = ReposyncError;

    /// `true` / `shallow` は直下のみ、`recursive` は再帰、`false` / 空文字列は無効
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "none" => Ok(SubmoduleMode::None),
            "true" | "shallow" => Ok(SubmoduleMode::Shallow),
            "recursive" => Ok(SubmoduleMode::Recursive),
            other => Err(ReposyncError::validation_error(
                "submodules",
                "expected one of: true, false, recursive",
                Some(other.to_string()),
            )),
        }
    }
}

impl fmt::Display for SubmoduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmoduleMode::None => "none",
            SubmoduleMode::Shallow => "shallow",
            SubmoduleMode::Recursive => "recursive",
        };
        write!(f, "{}", s)
    }
}

/// 1回の同期要求の入力
///
/// 生成後は読み取り専用として扱う。`reference` と `commit` が両方 `None` の場合は
/// リモートのデフォルトブランチを使用する。
#[derive(Debug, Clone, Validate)]
pub struct SyncSettings {
    /// リポジトリの所有者
    #[validate(length(min = 1, max = 255))]
    pub repository_owner: String,

    /// リポジトリ名
    #[validate(length(min = 1, max = 255))]
    pub repository_name: String,

    /// ホストサーバーのベースURL
    pub server_url: ServerUrl,

    /// チェックアウト先ディレクトリ
    pub repository_path: PathBuf,

    /// ブランチ、タグ、PR ref（未指定可）
    pub reference: Option<String>,

    /// コミットSHA（未指定可）
    pub commit: Option<String>,

    /// 取得する履歴の深さ（0 = 全履歴）
    pub fetch_depth: u32,

    pub fetch_tags: bool,

    pub show_progress: bool,

    /// 部分クローンフィルタ（例: `blob:none`）
    pub filter: Option<String>,

    pub sparse_checkout: Option<Vec<String>>,

    pub sparse_checkout_cone_mode: bool,

    /// 既存ワークスペースを `clean` / `reset` するか
    pub clean: bool,

    pub submodules: SubmoduleMode,

    pub lfs: bool,

    pub auth_token: Secret,

    pub ssh_key: Option<Secret>,

    pub ssh_known_hosts: Option<String>,

    pub ssh_strict: bool,

    pub ssh_user: String,

    /// 同期後も認証情報をローカル設定に残すか
    pub persist_credentials: bool,

    /// SSH URL書き換え用の組織ID
    pub workflow_organization_id: Option<String>,

    pub set_safe_directory: bool,

    /// gitの実行ファイル
    pub git_executable: PathBuf,

    /// 一時ファイル（SSH鍵、一時HOME）の作成先
    pub temp_dir: PathBuf,

    pub retry: RetryPolicy,
}

impl SyncSettings {
    /// 既定値で新しい設定を作成
    pub fn new(
        repository_owner: impl Into<String>,
        repository_name: impl Into<String>,
        repository_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository_owner: repository_owner.into(),
            repository_name: repository_name.into(),
            server_url: ServerUrl::default(),
            repository_path: repository_path.into(),
            reference: None,
            commit: None,
            fetch_depth: 1,
            fetch_tags: false,
            show_progress: false,
            filter: None,
            sparse_checkout: None,
            sparse_checkout_cone_mode: true,
            clean: true,
            submodules: SubmoduleMode::None,
            lfs: false,
            auth_token: Secret::default(),
            ssh_key: None,
            ssh_known_hosts: None,
            ssh_strict: true,
            ssh_user: "git".to_string(),
            persist_credentials: true,
            workflow_organization_id: None,
            set_safe_directory: true,
            git_executable: PathBuf::from("git"),
            temp_dir: std::env::temp_dir(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_server_url(mut self, server_url: ServerUrl) -> Self {
        self.server_url = server_url;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_fetch_depth(mut self, depth: u32) -> Self {
        self.fetch_depth = depth;
        self
    }

    pub fn with_fetch_tags(mut self, fetch_tags: bool) -> Self {
        self.fetch_tags = fetch_tags;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sparse_checkout(mut self, patterns: Vec<String>, cone_mode: bool) -> Self {
        self.sparse_checkout = Some(patterns);
        self.sparse_checkout_cone_mode = cone_mode;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_submodules(mut self, submodules: SubmoduleMode) -> Self {
        self.submodules = submodules;
        self
    }

    pub fn with_lfs(mut self, lfs: bool) -> Self {
        self.lfs = lfs;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Secret::new(token);
        self
    }

    pub fn with_ssh_key(mut self, key: impl Into<String>) -> Self {
        self.ssh_key = Some(Secret::new(key));
        self
    }

    pub fn with_ssh_known_hosts(mut self, known_hosts: impl Into<String>) -> Self {
        self.ssh_known_hosts = Some(known_hosts.into());
        self
    }

    pub fn with_ssh_strict(mut self, strict: bool) -> Self {
        self.ssh_strict = strict;
        self
    }

    pub fn with_persist_credentials(mut self, persist: bool) -> Self {
        self.persist_credentials = persist;
        self
    }

    pub fn with_organization_id(mut self, id: impl Into<String>) -> Self {
        self.workflow_organization_id = Some(id.into());
        self
    }

    pub fn with_set_safe_directory(mut self, set: bool) -> Self {
        self.set_safe_directory = set;
        self
    }

    pub fn with_git_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.git_executable = executable.into();
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// SSH鍵が設定されているか
    pub fn has_ssh_key(&self) -> bool {
        self.ssh_key.as_ref().is_some_and(|key| !key.is_empty())
    }

    pub fn has_sparse_checkout(&self) -> bool {
        self.sparse_checkout.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// `origin` に設定するフェッチURL
    pub fn fetch_url(&self) -> String {
        let ssh_user = if self.has_ssh_key() {
            Some(self.ssh_user.as_str())
        } else {
            None
        };
        self.server_url
            .fetch_url(&self.repository_owner, &self.repository_name, ssh_user)
    }

    /// 設定値を検証する
    pub fn validate(&self) -> ReposyncResult<()> {
        Validate::validate(self)?;

        if self.repository_path.as_os_str().is_empty() {
            return Err(ReposyncError::config_error("repository path is required"));
        }
        if let Some(reference) = &self.reference {
            if reference.trim().is_empty() {
                return Err(ReposyncError::config_error("ref must not be blank"));
            }
        }

        Ok(())
    }
}
