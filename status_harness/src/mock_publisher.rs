//! A publisher that records lifecycle calls instead of reporting them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use commit_status_publisher::services::message::DefaultStatusMessages;
use commit_status_publisher::{
    Build, BuildPromotion, BuildRevision, BuildStatus, CommitStatusPublisher, LifecycleEvent, QueueTaskInfo,
    QueuedBuild, Result, RevisionStatus,
};

use crate::event_gate::EventGate;
use crate::recorder::PublishRecorder;

pub const PUBLISHER_ERROR: &str = "Simulated publisher exception";

/// Grouping name for a promotion, `"<name> (<project>)"` when the build
/// configuration is known.
fn context_name(promotion: &BuildPromotion) -> String {
    promotion
        .build_type
        .as_ref()
        .map(|bt| bt.context_name())
        .unwrap_or_else(|| promotion.build_type_external_id.clone())
}

pub struct MockPublisher {
    id: String,
    recorder: Arc<PublishRecorder>,
    gate: EventGate,
    should_throw: AtomicBool,
    should_report_error: AtomicBool,
}

impl MockPublisher {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_recorder(id, Arc::new(PublishRecorder::new()))
    }

    pub fn with_recorder(id: impl Into<String>, recorder: Arc<PublishRecorder>) -> Self {
        Self {
            id: id.into(),
            recorder,
            gate: EventGate::default(),
            should_throw: AtomicBool::new(false),
            should_report_error: AtomicBool::new(false),
        }
    }

    /// Replace the gate, e.g. with one using a shorter wait timeout.
    pub fn with_gate(mut self, gate: EventGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn recorder(&self) -> &Arc<PublishRecorder> {
        &self.recorder
    }

    pub fn gate(&self) -> &EventGate {
        &self.gate
    }

    /// Make `build_finished` fail with [`PUBLISHER_ERROR`].
    pub fn should_throw(&self) {
        self.should_throw.store(true, Ordering::SeqCst);
    }

    /// Make `build_finished` report a problem against the build.
    pub fn should_report_error(&self) {
        self.should_report_error.store(true, Ordering::SeqCst);
    }

    async fn handle(&self, event: LifecycleEvent) {
        self.gate.pass(event).await;
        self.recorder.record_event(event);
    }

    fn record(&self, comment: Option<&str>, promotion: &BuildPromotion, revision: &BuildRevision) {
        self.recorder
            .record_publication(comment, &context_name(promotion), &revision.revision);
    }
}

#[async_trait]
impl CommitStatusPublisher for MockPublisher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn build_queued(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        info: &QueueTaskInfo,
    ) -> Result<bool> {
        self.handle(LifecycleEvent::Queued).await;
        self.record(Some(info.comment.as_str()), promotion, revision);
        Ok(true)
    }

    async fn build_removed_from_queue(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        info: &QueueTaskInfo,
    ) -> Result<bool> {
        // Removal is recorded without an event.
        self.record(Some(info.comment.as_str()), promotion, revision);
        self.recorder.record_user(info.comment_author.as_deref());
        Ok(true)
    }

    async fn build_started(&self, build: &Build, revision: &BuildRevision) -> Result<bool> {
        self.handle(LifecycleEvent::Started).await;
        self.record(Some(DefaultStatusMessages::BUILD_STARTED), &build.promotion, revision);
        Ok(true)
    }

    async fn build_finished(&self, build: &Build, revision: &BuildRevision) -> Result<bool> {
        self.handle(LifecycleEvent::Finished).await;
        self.record(Some(DefaultStatusMessages::BUILD_FINISHED), &build.promotion, revision);
        match build.status {
            BuildStatus::Normal => self.recorder.record_success(),
            BuildStatus::Failure => self.recorder.record_failure(),
            _ => {}
        }

        if self.should_throw.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!(PUBLISHER_ERROR).into());
        }
        if self.should_report_error.load(Ordering::SeqCst) {
            self.recorder.report_problem(&self.id, &build.describe());
        }
        Ok(true)
    }

    async fn build_commented(
        &self,
        build: &Build,
        revision: &BuildRevision,
        _author: Option<&str>,
        comment: Option<&str>,
        _in_progress: bool,
    ) -> Result<bool> {
        self.handle(LifecycleEvent::Commented).await;
        self.record(comment, &build.promotion, revision);
        Ok(true)
    }

    async fn build_interrupted(&self, _build: &Build, _revision: &BuildRevision) -> Result<bool> {
        self.handle(LifecycleEvent::Interrupted).await;
        Ok(true)
    }

    async fn build_failure_detected(&self, _build: &Build, _revision: &BuildRevision) -> Result<bool> {
        self.handle(LifecycleEvent::FailureDetected).await;
        self.recorder.record_failure();
        Ok(true)
    }

    async fn build_marked_as_successful(
        &self,
        _build: &Build,
        _revision: &BuildRevision,
        _in_progress: bool,
    ) -> Result<bool> {
        self.handle(LifecycleEvent::MarkedAsSuccessful).await;
        Ok(false)
    }

    async fn revision_status(
        &self,
        promotion: &BuildPromotion,
        _revision: &BuildRevision,
    ) -> Result<Option<RevisionStatus>> {
        let Some(event) = self.recorder.last_event() else {
            return Ok(None);
        };
        let is_last_for_revision = self.recorder.last_context().as_deref() == Some(context_name(promotion).as_str());
        Ok(Some(RevisionStatus {
            event: Some(event),
            description: self.recorder.last_comment(),
            is_last_for_revision,
        }))
    }

    async fn revision_status_for_removed_build(
        &self,
        removed: &QueuedBuild,
        revision: &BuildRevision,
    ) -> Result<Option<RevisionStatus>> {
        self.revision_status(&removed.promotion, revision).await
    }
}

impl std::fmt::Debug for MockPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPublisher").field("id", &self.id).finish_non_exhaustive()
    }
}
