//! ドメイン層: 同期要求の入力と結果、値オブジェクト

pub mod entities;
pub mod value_objects;

pub use entities::{CleanupState, SubmoduleMode, SyncOutcome, SyncSettings};
pub use value_objects::{CheckoutTarget, RefKind, Secret, ServerUrl};
