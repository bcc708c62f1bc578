use serde::{Deserialize, Serialize};
use std::fmt;

/// チェックアウト対象
///
/// `reference` はブランチ名、`refs/tags/...`、`refs/remotes/pull/...`、またはコミットSHA。
/// `start_point` がある場合はそのリモート追跡refからローカルブランチを作成する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutTarget {
    reference: String,
    start_point: Option<String>,
}

impl CheckoutTarget {
    /// Detached checkout of `reference`.
    pub fn detached(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            start_point: None,
        }
    }

    /// Local branch `branch` created from `start_point`.
    pub fn branch(branch: impl Into<String>, start_point: impl Into<String>) -> Self {
        Self {
            reference: branch.into(),
            start_point: Some(start_point.into()),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn start_point(&self) -> Option<&str> {
        self.start_point.as_deref()
    }
}

impl fmt::Display for CheckoutTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.start_point {
            Some(start) => write!(f, "{} (from {})", self.reference, start),
            None => write!(f, "{}", self.reference),
        }
    }
}

/// 要求されたrefの分類（大文字小文字を区別しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// `refs/heads/<name>`
    Branch(String),
    /// `refs/pull/<rest>`
    PullRequest(String),
    /// `refs/tags/<name>`
    Tag(String),
    /// Any other `refs/...`
    Qualified,
    /// No `refs/` prefix
    Unqualified,
}

const HEADS_PREFIX: &str = "refs/heads/";
const PULL_PREFIX: &str = "refs/pull/";
const TAGS_PREFIX: &str = "refs/tags/";

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

impl RefKind {
    pub fn classify(reference: &str) -> Self {
        if let Some(name) = strip_prefix_ignore_case(reference, HEADS_PREFIX) {
            RefKind::Branch(name.to_string())
        } else if let Some(rest) = strip_prefix_ignore_case(reference, PULL_PREFIX) {
            RefKind::PullRequest(rest.to_string())
        } else if let Some(name) = strip_prefix_ignore_case(reference, TAGS_PREFIX) {
            RefKind::Tag(name.to_string())
        } else if strip_prefix_ignore_case(reference, "refs/").is_some() {
            RefKind::Qualified
        } else {
            RefKind::Unqualified
        }
    }
}
