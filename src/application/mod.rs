//! アプリケーション層: ワークスペースの準備と同期ユースケース

pub mod services;
pub mod use_cases;

pub use services::workspace_reconciler::{ReconcileDecision, WorkspaceReconciler};
pub use use_cases::sync_repository::SyncOrchestrator;
