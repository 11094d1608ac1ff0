//! Commit status payload construction.

use crate::models::commit_status::{PublishCommitStatus, RemoteStatus};
use crate::models::revision::BuildRevision;

const REFS_HEADS: &str = "refs/heads/";
const REFS_TAGS: &str = "refs/tags/";

/// Descriptions used when the event carries no text of its own.
pub struct DefaultStatusMessages;

impl DefaultStatusMessages {
    pub const BUILD_QUEUED: &'static str = "Build queued";
    pub const BUILD_REMOVED_FROM_QUEUE: &'static str = "Build removed from queue";
    pub const BUILD_STARTED: &'static str = "Build started";
    pub const BUILD_FINISHED: &'static str = "Build finished";
    pub const BUILD_MARKED_SUCCESSFUL: &'static str = "Build marked as successful";
}

/// Branch or tag name GitLab knows the ref by.
///
/// Refs outside `refs/heads/` and `refs/tags/` (merge request refs, for
/// one) have no branch name on the GitLab side and give `None`.
pub fn normalize_ref(vcs_branch: &str) -> Option<&str> {
    vcs_branch
        .strip_prefix(REFS_HEADS)
        .or_else(|| vcs_branch.strip_prefix(REFS_TAGS))
        .filter(|name| !name.is_empty())
}

pub fn build_message(
    status: RemoteStatus,
    name: &str,
    revision: &BuildRevision,
    view_url: &str,
    description: &str,
) -> PublishCommitStatus {
    PublishCommitStatus {
        state: status,
        description: description.to_string(),
        context: name.to_string(),
        target_url: view_url.to_string(),
        git_ref: revision
            .vcs_branch
            .as_deref()
            .and_then(normalize_ref)
            .map(str::to_string),
    }
}
