//! Assertion helpers for testing

use std::path::Path;

use super::test_fixtures::git;

/// Assert that a file exists
#[macro_export]
macro_rules! assert_file_exists {
    ($path:expr) => {
        assert!($path.exists(), "File should exist: {}", $path.display());
    };
}

/// Assert that a file does not exist
#[macro_export]
macro_rules! assert_file_not_exists {
    ($path:expr) => {
        assert!(!$path.exists(), "File should not exist: {}", $path.display());
    };
}

/// Assert the contents of a file
#[macro_export]
macro_rules! assert_file_content {
    ($path:expr, $expected:expr) => {
        let actual = std::fs::read_to_string(&$path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", $path.display(), e));
        pretty_assertions::assert_eq!(actual, $expected);
    };
}

/// Assert that HEAD of the checkout at `dir` is `sha`
pub fn assert_head_at(dir: &Path, sha: &str) {
    let head = git(dir, &["rev-parse", "HEAD"]);
    assert_eq!(head, sha, "HEAD of {} should be {}", dir.display(), sha);
}

/// Assert that the checkout has no local modifications or untracked files
pub fn assert_worktree_clean(dir: &Path) {
    let status = git(dir, &["status", "--porcelain"]);
    assert!(status.is_empty(), "Worktree should be clean, got:\n{}", status);
}
