pub mod workspace_reconciler;
