//! Reference classification, refspec construction and post-fetch checks.
//!
//! Everything here is derived from the requested ref/commit plus facts
//! reported by a [`GitCommands`] implementation; no state is kept.

use tracing::debug;

use crate::common::error::ReposyncError;
use crate::common::result::ReposyncResult;
use crate::domain::value_objects::checkout_target::{CheckoutTarget, RefKind};
use crate::infrastructure::git::command_manager::GitCommands;

pub const TAGS_REFSPEC: &str = "+refs/tags/*:refs/tags/*";
const REMOTE_ORIGIN: &str = "refs/remotes/origin";
const REMOTE_PULL: &str = "refs/remotes/pull";

fn missing_ref_and_commit() -> ReposyncError {
    ReposyncError::config_error("Args ref and commit cannot both be empty")
}

/// Decide what to check out for the requested ref and commit.
///
/// Unqualified names are looked up as a remote-tracking branch first, then as a
/// tag, so a branch wins when both exist.
pub async fn resolve_checkout_target(
    git: &dyn GitCommands,
    reference: Option<&str>,
    commit: Option<&str>,
) -> ReposyncResult<CheckoutTarget> {
    let Some(reference) = reference.filter(|r| !r.is_empty()) else {
        return match commit.filter(|c| !c.is_empty()) {
            Some(commit) => Ok(CheckoutTarget::detached(commit)),
            None => Err(missing_ref_and_commit()),
        };
    };

    match RefKind::classify(reference) {
        RefKind::Branch(branch) => Ok(CheckoutTarget::branch(
            branch.clone(),
            format!("{}/{}", REMOTE_ORIGIN, branch),
        )),
        RefKind::PullRequest(rest) => {
            Ok(CheckoutTarget::detached(format!("{}/{}", REMOTE_PULL, rest)))
        }
        RefKind::Tag(_) | RefKind::Qualified => Ok(CheckoutTarget::detached(reference)),
        RefKind::Unqualified => {
            if git.branch_exists(true, &format!("origin/{}", reference)).await? {
                Ok(CheckoutTarget::branch(
                    reference,
                    format!("{}/{}", REMOTE_ORIGIN, reference),
                ))
            } else if git.tag_exists(reference).await? {
                Ok(CheckoutTarget::detached(format!("refs/tags/{}", reference)))
            } else {
                Err(ReposyncError::ambiguous_reference(reference))
            }
        }
    }
}

/// Refspecs for a full-history fetch: every branch and tag, plus the PR ref
/// when one was requested since PR refs are not branches.
pub fn full_history_refspecs(reference: Option<&str>, commit: Option<&str>) -> Vec<String> {
    let mut result = vec![
        format!("+refs/heads/*:{}/*", REMOTE_ORIGIN),
        TAGS_REFSPEC.to_string(),
    ];

    if let Some(reference) = reference {
        if let RefKind::PullRequest(rest) = RefKind::classify(reference) {
            let source = commit.filter(|c| !c.is_empty()).unwrap_or(reference);
            result.push(format!("+{}:{}/{}", source, REMOTE_PULL, rest));
        }
    }

    result
}

/// Refspecs for a targeted fetch of the requested ref and commit.
pub fn refspecs(reference: Option<&str>, commit: Option<&str>) -> ReposyncResult<Vec<String>> {
    let reference = reference.filter(|r| !r.is_empty());
    let commit = commit.filter(|c| !c.is_empty());

    match (reference, commit) {
        (None, None) => Err(missing_ref_and_commit()),
        (reference, Some(commit)) => {
            let spec = match reference.map(RefKind::classify) {
                Some(RefKind::Branch(branch)) => {
                    format!("+{}:{}/{}", commit, REMOTE_ORIGIN, branch)
                }
                Some(RefKind::PullRequest(rest)) => {
                    format!("+{}:{}/{}", commit, REMOTE_PULL, rest)
                }
                Some(RefKind::Tag(_)) => format!("+{}:{}", commit, reference.unwrap_or_default()),
                _ => commit.to_string(),
            };
            Ok(vec![spec])
        }
        (Some(reference), None) => Ok(match RefKind::classify(reference) {
            // Ambiguous short name: fetch both, checkout resolves
            RefKind::Unqualified => vec![
                format!("+refs/heads/{0}*:{1}/{0}*", reference, REMOTE_ORIGIN),
                format!("+refs/tags/{0}*:refs/tags/{0}*", reference),
            ],
            RefKind::Branch(branch) => {
                vec![format!("+{}:{}/{}", reference, REMOTE_ORIGIN, branch)]
            }
            RefKind::PullRequest(rest) => {
                vec![format!("+{}:{}/{}", reference, REMOTE_PULL, rest)]
            }
            RefKind::Tag(_) | RefKind::Qualified => vec![format!("+{0}:{0}", reference)],
        }),
    }
}

/// Check that the fetched ref still points at the expected commit.
///
/// PR refs and unrecognized formats are assumed consistent.
pub async fn verify_post_fetch_state(
    git: &dyn GitCommands,
    reference: Option<&str>,
    commit: Option<&str>,
) -> ReposyncResult<bool> {
    let Some(commit) = commit.filter(|c| !c.is_empty()) else {
        return Ok(true);
    };
    let Some(reference) = reference.filter(|r| !r.is_empty()) else {
        return git.sha_exists(commit).await;
    };

    match RefKind::classify(reference) {
        RefKind::Branch(branch) => {
            if !git.branch_exists(true, &format!("origin/{}", branch)).await? {
                return Ok(false);
            }
            let sha = git.rev_parse(&format!("{}/{}", REMOTE_ORIGIN, branch)).await?;
            Ok(sha == commit)
        }
        RefKind::PullRequest(_) => Ok(true),
        RefKind::Tag(tag) => {
            if !git.tag_exists(&tag).await? {
                return Ok(false);
            }
            let sha = git.rev_parse(reference).await?;
            Ok(sha == commit)
        }
        RefKind::Unqualified | RefKind::Qualified => {
            debug!(reference = %reference, "Unexpected ref format when testing ref info");
            Ok(true)
        }
    }
}
