//! Shared utilities: error taxonomy, result helpers and retry.

pub mod error;
pub mod result;
pub mod retry;

pub use error::ReposyncError;
pub use result::{OptionExt, ReposyncResult, ReposyncResultExt, ResultExt};
pub use retry::{RetryExecutor, RetryPolicy};
