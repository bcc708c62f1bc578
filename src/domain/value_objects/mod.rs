pub mod checkout_target;
pub mod git_version;
pub mod secret;
pub mod server_url;

pub use checkout_target::{CheckoutTarget, RefKind};
pub use git_version::{GitVersion, GitVersionError};
pub use secret::Secret;
pub use server_url::{ServerUrl, ServerUrlError};
