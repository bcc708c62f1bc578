pub mod sync_outcome;
pub mod sync_settings;

pub use sync_outcome::{CleanupState, SyncOutcome};
pub use sync_settings::{SubmoduleMode, SyncSettings};
