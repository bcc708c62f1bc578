use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;
use crate::domain::value_objects::secret::Secret;
use crate::domain::value_objects::server_url::ServerUrl;

const USER_AGENT: &str = concat!("reposync/", env!("CARGO_PKG_VERSION"));

/// Remote repository metadata and archive API.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Default branch of `owner/repo`, prefixed with `refs/heads/`.
    async fn default_branch(&self, owner: &str, repo: &str) -> ReposyncResult<String>;

    /// gzip tarball of `owner/repo` at `reference` (a ref or commit SHA).
    async fn download_archive(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> ReposyncResult<Vec<u8>>;
}

#[derive(Deserialize)]
struct RepositoryInfo {
    default_branch: Option<String>,
}

/// [`RepositoryApi`] over the REST API of the configured server.
#[derive(Debug, Clone)]
pub struct HttpRepositoryApi {
    client: Client,
    api_url: String,
    token: Secret,
}

impl HttpRepositoryApi {
    pub fn new(server_url: &ServerUrl, token: Secret) -> ReposyncResult<Self> {
        Self::with_api_url(server_url.api_url(), token)
    }

    pub fn with_api_url(api_url: impl Into<String>, token: Secret) -> ReposyncResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(self.token.expose())
        }
    }
}

fn with_refs_heads(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{}", branch)
    }
}

#[async_trait]
impl RepositoryApi for HttpRepositoryApi {
    async fn default_branch(&self, owner: &str, repo: &str) -> ReposyncResult<String> {
        info!("Retrieving the default branch name");
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);
        let response = self.get(&url).send().await?;

        let branch = if response.status() == StatusCode::NOT_FOUND
            && repo.to_uppercase().ends_with(".WIKI")
        {
            "master".to_string()
        } else {
            let info: RepositoryInfo = response.error_for_status()?.json().await?;
            info.default_branch
                .filter(|b| !b.is_empty())
                .ok_or_else(|| {
                    ReposyncError::network_error("default_branch cannot be empty", Some(url))
                })?
        };

        info!("Default branch '{}'", branch);
        Ok(with_refs_heads(&branch))
    }

    async fn download_archive(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> ReposyncResult<Vec<u8>> {
        let url = format!("{}/repos/{}/{}/tarball/{}", self.api_url, owner, repo, reference);
        let response = self.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
