pub mod fs_helper;
pub mod settings_store;

pub use settings_store::{parse_repository, SettingsFile, SettingsStore};
