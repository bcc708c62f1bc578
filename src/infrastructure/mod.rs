/// Infrastructure layer modules
///
/// Concrete implementations for external system interactions:
/// - Process execution (git and shell invocations)
/// - Git operations (typed commands, ref resolution, credentials)
/// - File system operations (removal, moves, settings and state files)
/// - Remote API (default branch lookup, archive download)
pub mod api;
pub mod filesystem;
pub mod git;
pub mod process;

pub use api::{ArchiveFallbackFetcher, HttpRepositoryApi, RepositoryApi};
pub use filesystem::SettingsStore;
pub use git::{AuthManager, GitCommandManager, GitCommands};
pub use process::CommandExecutor;
