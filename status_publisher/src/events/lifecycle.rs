//! Lifecycle event definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::commit_status::RemoteStatus;
use crate::services::status_mapper;

/// Events that can happen to a build between queueing and completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Build was put into the queue.
    Queued,
    /// Build left the queue without starting (canceled or replaced).
    RemovedFromQueue,
    /// Build execution has started on an agent.
    Started,
    /// Build finished, successfully or not.
    Finished,
    /// Someone commented on the build.
    Commented,
    /// Build was stopped before it finished.
    Interrupted,
    /// A failure was detected while the build is still running.
    FailureDetected,
    /// Build was manually marked as successful.
    MarkedAsSuccessful,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Queued => "queued",
            LifecycleEvent::RemovedFromQueue => "removed_from_queue",
            LifecycleEvent::Started => "started",
            LifecycleEvent::Finished => "finished",
            LifecycleEvent::Commented => "commented",
            LifecycleEvent::Interrupted => "interrupted",
            LifecycleEvent::FailureDetected => "failure_detected",
            LifecycleEvent::MarkedAsSuccessful => "marked_as_successful",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event that changes the remote status, with the outcome
/// flags needed to decide which status.
///
/// `Commented` has no transition: comments do not move a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Queued,
    RemovedFromQueue { promotion_replaced: bool },
    Started,
    Finished { successful: bool },
    FailureDetected,
    MarkedAsSuccessful { in_progress: bool },
    Interrupted,
}

impl StatusTransition {
    pub fn event(&self) -> LifecycleEvent {
        match self {
            StatusTransition::Queued => LifecycleEvent::Queued,
            StatusTransition::RemovedFromQueue { .. } => LifecycleEvent::RemovedFromQueue,
            StatusTransition::Started => LifecycleEvent::Started,
            StatusTransition::Finished { .. } => LifecycleEvent::Finished,
            StatusTransition::FailureDetected => LifecycleEvent::FailureDetected,
            StatusTransition::MarkedAsSuccessful { .. } => LifecycleEvent::MarkedAsSuccessful,
            StatusTransition::Interrupted => LifecycleEvent::Interrupted,
        }
    }

    /// Status GitLab should show after this transition.
    pub fn remote_status(&self) -> RemoteStatus {
        status_mapper::remote_status(*self)
    }
}
