//! # reposync - Repository checkout engine
//!
//! `reposync` checks out one reference of a remote git repository into a local
//! working directory, reusing a previous checkout when it can. It is meant for
//! CI runners and build hosts where the same directory is synced over and over.
//!
//! ## Features
//!
//! - **Workspace reuse**: Existing checkouts are cleaned and reused, or recreated when unusable
//! - **Reference resolution**: Branches, tags, pull request refs and bare commit SHAs
//! - **Credential handling**: Token and SSH key auth that never puts secrets on a command line
//! - **Submodules, LFS and sparse checkout**
//! - **Archive fallback**: Downloads a tarball through the REST API when git is unavailable
//!
//! ## Quick Start
//!
//! ```bash
//! reposync sync --repository octo/hello --ref main --path ./hello --state-file state.json
//! reposync cleanup --state-file state.json
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: Sync settings, outcome and value objects
//! - [`application`]: Workspace reconciliation and the sync use case
//! - [`infrastructure`]: git, filesystem, process and remote API access
//! - [`presentation`]: CLI interface
//! - [`common`]: Errors, result helpers and retry
//!
//! ## Examples
//!
//! ```rust,no_run
//! use reposync::application::SyncOrchestrator;
//! use reposync::domain::SyncSettings;
//!
//! # async fn example() -> reposync::Result<()> {
//! let settings = SyncSettings::new("octo", "hello", "/work/hello")
//!     .with_reference("refs/heads/main")
//!     .with_fetch_depth(1);
//!
//! let orchestrator = SyncOrchestrator::new();
//! let outcome = orchestrator.sync(&settings).await?;
//! println!("Checked out {:?}", outcome.commit);
//!
//! // Later, remove persisted credentials
//! orchestrator.cleanup(&outcome.cleanup_state()).await?;
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use crate::common::error::ReposyncError;
pub use crate::common::result::ReposyncResult as Result;
