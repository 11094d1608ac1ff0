//! Ordered log of what a mock publisher received.
//!
//! Writes are append-only; reads return copies so assertions never hold
//! the lock.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use commit_status_publisher::LifecycleEvent;
use serde::Serialize;

/// A problem a publisher reported against a build instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedProblem {
    pub publisher_id: String,
    pub build: String,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecorderSnapshot {
    pub events: Vec<LifecycleEvent>,
    pub comments: Vec<Option<String>>,
    pub contexts: Vec<String>,
    pub target_revisions: Vec<String>,
    pub last_user: Option<String>,
    pub successes: usize,
    pub failures: usize,
    pub problems: Vec<ReportedProblem>,
}

#[derive(Debug, Default)]
pub struct PublishRecorder {
    state: Mutex<RecorderSnapshot>,
}

impl PublishRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RecorderSnapshot> {
        // A panicking test thread must not hide what was recorded before it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_event(&self, event: LifecycleEvent) {
        tracing::debug!(%event, "Recorded lifecycle event");
        self.state().events.push(event);
    }

    /// Record one publication: its description, build context and commit.
    pub fn record_publication(&self, comment: Option<&str>, context: &str, revision: &str) {
        let mut state = self.state();
        state.comments.push(comment.map(str::to_string));
        state.contexts.push(context.to_string());
        state.target_revisions.push(revision.to_string());
    }

    pub fn record_user(&self, user: Option<&str>) {
        self.state().last_user = user.map(str::to_string);
    }

    pub fn record_success(&self) {
        self.state().successes += 1;
    }

    pub fn record_failure(&self) {
        self.state().failures += 1;
    }

    pub fn report_problem(&self, publisher_id: &str, build: &str) {
        tracing::warn!(publisher = publisher_id, build, "Publisher reported a problem");
        self.state().problems.push(ReportedProblem {
            publisher_id: publisher_id.to_string(),
            build: build.to_string(),
            reported_at: Utc::now(),
        });
    }

    pub fn snapshot(&self) -> RecorderSnapshot {
        self.state().clone()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.state().events.clone()
    }

    pub fn last_event(&self) -> Option<LifecycleEvent> {
        self.state().events.last().copied()
    }

    pub fn comments(&self) -> Vec<Option<String>> {
        self.state().comments.clone()
    }

    pub fn last_comment(&self) -> Option<String> {
        self.state().comments.last().cloned().flatten()
    }

    pub fn last_context(&self) -> Option<String> {
        self.state().contexts.last().cloned()
    }

    pub fn target_revisions(&self) -> Vec<String> {
        self.state().target_revisions.clone()
    }

    pub fn last_target_revision(&self) -> Option<String> {
        self.state().target_revisions.last().cloned()
    }

    pub fn last_user(&self) -> Option<String> {
        self.state().last_user.clone()
    }

    pub fn is_success_received(&self) -> bool {
        self.state().successes > 0
    }

    pub fn is_failure_received(&self) -> bool {
        self.state().failures > 0
    }

    pub fn successes(&self) -> usize {
        self.state().successes
    }

    pub fn failures(&self) -> usize {
        self.state().failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_recorder() {
        let recorder = PublishRecorder::new();
        assert_eq!(recorder.last_event(), None);
        assert_eq!(recorder.last_comment(), None);
        assert_eq!(recorder.last_target_revision(), None);
        assert!(!recorder.is_success_received());
        assert!(!recorder.is_failure_received());
    }

    #[test]
    fn test_records_in_order() {
        let recorder = PublishRecorder::new();
        recorder.record_event(LifecycleEvent::Queued);
        recorder.record_publication(Some("queued by push"), "Build (Web)", "abc123");
        recorder.record_event(LifecycleEvent::Started);
        recorder.record_publication(Some("Build started"), "Build (Web)", "def456");

        assert_eq!(recorder.events(), vec![LifecycleEvent::Queued, LifecycleEvent::Started]);
        assert_eq!(recorder.last_comment().as_deref(), Some("Build started"));
        assert_eq!(recorder.target_revisions(), vec!["abc123".to_string(), "def456".to_string()]);
        assert_eq!(recorder.last_context().as_deref(), Some("Build (Web)"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let recorder = PublishRecorder::new();
        recorder.record_event(LifecycleEvent::FailureDetected);
        recorder.record_failure();
        recorder.report_problem("mock", "build #1");

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.problems[0].build, "build #1");

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["events"][0], "failure_detected");
        assert_eq!(json["problems"][0]["publisher_id"], "mock");
    }
}
