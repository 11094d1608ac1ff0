//! Reconstruct what was last reported for a revision.
//!
//! GitLab keeps one latest status per (commit, name). Reading it back tells
//! which event most likely produced it and, by comparing its target URL with
//! the asking build's view URL, whether a newer attempt has overwritten it.

use crate::error::Result;
use crate::models::commit_status::{ReceivedCommitStatus, RevisionStatus};
use crate::services::gitlab_service::{self, GitlabTarget};
use crate::services::http_client::HttpTransport;
use crate::services::status_mapper;

/// `None` when GitLab has no status: no opinion, not a default state.
pub fn revision_status(view_url: &str, commit_status: Option<ReceivedCommitStatus>) -> Option<RevisionStatus> {
    let commit_status = commit_status?;
    let event = status_mapper::event_for(&commit_status);
    let is_last_for_revision = commit_status.target_url.as_deref() == Some(view_url);
    Some(RevisionStatus {
        event,
        description: commit_status.description,
        is_last_for_revision,
    })
}

/// Query GitLab for the latest status of `commit` and reconcile it against
/// `view_url`.
pub async fn latest_revision_status<T: HttpTransport + ?Sized>(
    transport: &T,
    target: GitlabTarget<'_>,
    commit: &str,
    context: Option<&str>,
    view_url: &str,
) -> Result<Option<RevisionStatus>> {
    let latest = gitlab_service::latest_status(transport, target, commit, context).await?;
    crate::metrics::revision_status_queried(latest.is_some());

    let status = revision_status(view_url, latest);
    tracing::debug!(
        repository = %target.repository,
        commit,
        found = status.is_some(),
        current = status.as_ref().is_some_and(|s| s.is_last_for_revision),
        "Reconciled GitLab commit status"
    );
    Ok(status)
}
