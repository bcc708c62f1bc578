pub mod archive_fetcher;
pub mod repository_api;

pub use archive_fetcher::ArchiveFallbackFetcher;
pub use repository_api::{HttpRepositoryApi, RepositoryApi};
