//! Mapping between lifecycle events and GitLab commit status states.
//!
//! The forward direction is total. The reverse direction is lossy: several
//! events end in the same state, so only `pending` and a `canceled` status
//! carrying the removal message can be traced back to an event.

use crate::events::lifecycle::{LifecycleEvent, StatusTransition};
use crate::models::commit_status::{ReceivedCommitStatus, RemoteStatus};
use crate::services::message::DefaultStatusMessages;

/// State GitLab should hold after `transition`.
pub fn remote_status(transition: StatusTransition) -> RemoteStatus {
    match transition {
        StatusTransition::Queued => RemoteStatus::Pending,
        StatusTransition::RemovedFromQueue { promotion_replaced: true } => RemoteStatus::Pending,
        StatusTransition::RemovedFromQueue { promotion_replaced: false } => RemoteStatus::Canceled,
        StatusTransition::Started => RemoteStatus::Running,
        StatusTransition::Finished { successful: true } => RemoteStatus::Success,
        StatusTransition::Finished { successful: false } => RemoteStatus::Failed,
        StatusTransition::FailureDetected => RemoteStatus::Failed,
        StatusTransition::MarkedAsSuccessful { in_progress: true } => RemoteStatus::Running,
        StatusTransition::MarkedAsSuccessful { in_progress: false } => RemoteStatus::Success,
        StatusTransition::Interrupted => RemoteStatus::Canceled,
    }
}

/// Event that most likely produced `status`, if it can be told apart.
///
/// `canceled` is written both for removed-from-queue and interrupted builds;
/// only the removal message in the description distinguishes them.
pub fn triggered_event(status: Option<&str>, description: Option<&str>) -> Option<LifecycleEvent> {
    let Some(status) = status else {
        tracing::warn!("No GitLab build status is provided. Related event can not be calculated");
        return None;
    };
    let Some(remote) = RemoteStatus::from_name(status) else {
        tracing::warn!(status, "Unknown GitLab build status. Related event can not be calculated");
        return None;
    };

    match remote {
        RemoteStatus::Pending => Some(LifecycleEvent::Queued),
        RemoteStatus::Canceled => description
            .filter(|d| d.contains(DefaultStatusMessages::BUILD_REMOVED_FROM_QUEUE))
            .map(|_| LifecycleEvent::RemovedFromQueue),
        RemoteStatus::Running | RemoteStatus::Success | RemoteStatus::Failed => None,
    }
}

/// [`triggered_event`] for a status read back from GitLab.
pub fn event_for(commit_status: &ReceivedCommitStatus) -> Option<LifecycleEvent> {
    triggered_event(commit_status.status.as_deref(), commit_status.description.as_deref())
}
