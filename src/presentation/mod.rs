//! プレゼンテーション層: `reposync` コマンドラインインターフェース

pub mod cli;
