use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// サーバーURL関連のエラー
#[derive(Debug, Error, PartialEq)]
pub enum ServerUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// リポジトリをホストするサーバーのベースURL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerUrl {
    url: Url,
}

impl ServerUrl {
    /// 新しいServerUrlを作成。空文字列は `https://github.com` とみなす
    pub fn new(url: &str) -> Result<Self, ServerUrlError> {
        let trimmed = url.trim();
        let raw = if trimmed.is_empty() {
            DEFAULT_SERVER_URL
        } else {
            trimmed
        };

        let parsed = Url::parse(raw).map_err(|_| ServerUrlError::InvalidFormat(raw.to_string()))?;
        if parsed.scheme().starts_with("http") && parsed.host_str().is_none() {
            return Err(ServerUrlError::MissingHost(raw.to_string()));
        }

        Ok(Self { url: parsed })
    }

    /// `SCHEME://HOSTNAME[:PORT]`
    ///
    /// Non-network schemes (`file://`) have an opaque origin, so the full URL
    /// without its trailing slash stands in for it.
    pub fn origin(&self) -> String {
        let origin = self.url.origin();
        if origin.is_tuple() {
            origin.ascii_serialization()
        } else {
            self.url.as_str().trim_end_matches('/').to_string()
        }
    }

    /// ホスト名（`file://` の場合は空文字列）
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn is_github_dotcom(&self) -> bool {
        self.hostname().eq_ignore_ascii_case("github.com")
    }

    /// REST APIのベースURL
    pub fn api_url(&self) -> String {
        if self.is_github_dotcom() {
            "https://api.github.com".to_string()
        } else {
            format!("{}/api/v3", self.origin())
        }
    }

    /// `origin` リモートに設定するフェッチURLを生成する
    ///
    /// SSHユーザーが指定された場合は `user@host:owner/name.git` 形式になる。
    pub fn fetch_url(&self, owner: &str, name: &str, ssh_user: Option<&str>) -> String {
        let owner = encode_component(owner);
        let name = encode_component(name);

        match ssh_user {
            Some(user) => {
                let user = if user.is_empty() { "git" } else { user };
                format!("{}@{}:{}/{}.git", user, self.hostname(), owner, name)
            }
            None => format!("{}/{}/{}", self.origin(), owner, name),
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl Default for ServerUrl {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_SERVER_URL).expect("default server url is valid"),
        }
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl TryFrom<String> for ServerUrl {
    type Error = ServerUrlError;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        ServerUrl::new(&url)
    }
}

impl TryFrom<&str> for ServerUrl {
    type Error = ServerUrlError;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        ServerUrl::new(url)
    }
}

impl From<ServerUrl> for String {
    fn from(url: ServerUrl) -> Self {
        url.url.to_string()
    }
}

/// encodeURIComponent相当のエンコード
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
