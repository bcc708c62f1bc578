pub mod auth_manager;
pub mod command_manager;
#[cfg(test)]
pub mod fake;
pub mod ref_resolver;

pub use auth_manager::{AuthManager, CredentialSession};
pub use command_manager::{
    FetchOptions, GitCommandManager, GitCommands, GitManagerOptions, GitOutput,
};
pub use ref_resolver::{
    full_history_refspecs, refspecs, resolve_checkout_target, verify_post_fetch_state,
};
