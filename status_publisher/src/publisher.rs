//! Publisher: turns build lifecycle events into GitLab commit statuses.
//!
//! Each event is handled on its own: settings are read, the repository is
//! resolved, one request is sent, and the caller gets the outcome. Nothing is
//! queued or deduplicated locally; GitLab's last-write-wins storage plus the
//! "already in that state" classification absorb duplicate and racing events.

use async_trait::async_trait;

use crate::config::SettingsProvider;
use crate::error::{PublisherError, Result};
use crate::events::lifecycle::StatusTransition;
use crate::models::build::{Build, BuildPromotion, QueueTaskInfo, QueuedBuild};
use crate::models::commit_status::RevisionStatus;
use crate::models::repository::Repository;
use crate::models::revision::BuildRevision;
use crate::services::gitlab_service::{self, GitlabTarget};
use crate::services::http_client::HttpTransport;
use crate::services::message::{build_message, DefaultStatusMessages};
use crate::services::reconciler;
use crate::services::repository::parse_repository;

pub const GITLAB_PUBLISHER_ID: &str = "gitlabStatusPublisher";

/// Receiver of build lifecycle events.
///
/// Lifecycle methods return `Ok(true)` when the event was handled and
/// `Ok(false)` when the publisher has nothing to do for it.
#[async_trait]
pub trait CommitStatusPublisher: Send + Sync {
    fn id(&self) -> &str;

    async fn build_queued(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        info: &QueueTaskInfo,
    ) -> Result<bool>;

    async fn build_removed_from_queue(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        info: &QueueTaskInfo,
    ) -> Result<bool>;

    async fn build_started(&self, build: &Build, revision: &BuildRevision) -> Result<bool>;

    async fn build_finished(&self, build: &Build, revision: &BuildRevision) -> Result<bool>;

    async fn build_commented(
        &self,
        _build: &Build,
        _revision: &BuildRevision,
        _author: Option<&str>,
        _comment: Option<&str>,
        _in_progress: bool,
    ) -> Result<bool> {
        Ok(false)
    }

    async fn build_interrupted(&self, build: &Build, revision: &BuildRevision) -> Result<bool>;

    async fn build_failure_detected(&self, build: &Build, revision: &BuildRevision) -> Result<bool>;

    async fn build_marked_as_successful(
        &self,
        build: &Build,
        revision: &BuildRevision,
        in_progress: bool,
    ) -> Result<bool>;

    /// What was last reported for `revision`, judged from `promotion`'s side.
    async fn revision_status(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
    ) -> Result<Option<RevisionStatus>>;

    /// Same as [`revision_status`](Self::revision_status) for a build that
    /// has left the queue; currency is judged against its queued view URL.
    async fn revision_status_for_removed_build(
        &self,
        removed: &QueuedBuild,
        revision: &BuildRevision,
    ) -> Result<Option<RevisionStatus>>;
}

/// Everything a GitLab call needs, resolved from settings and the VCS root.
struct Endpoint {
    api_url: String,
    token: String,
    repository: Repository,
}

pub struct GitlabPublisher<T, C> {
    transport: T,
    settings: C,
}

impl<T: HttpTransport, C: SettingsProvider> GitlabPublisher<T, C> {
    pub fn new(transport: T, settings: C) -> Self {
        Self { transport, settings }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `Ok(None)` when the revision's root is not a GitLab repository.
    fn endpoint(&self, revision: &BuildRevision) -> Result<Option<Endpoint>> {
        let settings = self.settings.settings();
        let api_url = settings.api_url().ok_or(PublisherError::MissingApiUrl)?;
        let token = settings.token().ok_or(PublisherError::MissingToken)?;
        let prefix = settings.path_prefix();

        Ok(parse_repository(&revision.root, prefix.as_deref())?.map(|repository| Endpoint {
            api_url: api_url.to_string(),
            token: token.to_string(),
            repository,
        }))
    }

    async fn publish(
        &self,
        transition: StatusTransition,
        context: &str,
        view_url: &str,
        revision: &BuildRevision,
        description: &str,
        subject: String,
    ) -> Result<bool> {
        let status = transition.remote_status();
        let result = self.send_status(transition, context, view_url, revision, description).await;

        match &result {
            Ok(true) => {
                crate::metrics::status_published(status);
                tracing::info!(
                    build = %subject,
                    commit = %revision.revision,
                    event = %transition.event(),
                    state = %status,
                    "Published GitLab commit status"
                );
            }
            Ok(false) => {}
            Err(e) => {
                crate::metrics::failure(e.kind());
                tracing::warn!(
                    build = %subject,
                    commit = %revision.revision,
                    event = %transition.event(),
                    "GitLab commit status publish failed: {e}"
                );
            }
        }
        result
    }

    async fn send_status(
        &self,
        transition: StatusTransition,
        context: &str,
        view_url: &str,
        revision: &BuildRevision,
        description: &str,
    ) -> Result<bool> {
        let Some(endpoint) = self.endpoint(revision)? else {
            return Ok(false);
        };
        let message = build_message(transition.remote_status(), context, revision, view_url, description);
        let target = GitlabTarget {
            api_url: &endpoint.api_url,
            token: &endpoint.token,
            repository: &endpoint.repository,
            root_name: &revision.root.name,
        };
        gitlab_service::post_status(&self.transport, target, &revision.revision, &message).await?;
        Ok(true)
    }

    async fn query(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        view_url: &str,
    ) -> Result<Option<RevisionStatus>> {
        let Some(endpoint) = self.endpoint(revision)? else {
            return Ok(None);
        };
        let target = GitlabTarget {
            api_url: &endpoint.api_url,
            token: &endpoint.token,
            repository: &endpoint.repository,
            root_name: &revision.root.name,
        };
        let context = promotion.build_type.as_ref().map(|_| promotion.status_context());

        reconciler::latest_revision_status(&self.transport, target, &revision.revision, context, view_url)
            .await
            .inspect_err(|e| crate::metrics::failure(e.kind()))
    }
}

#[async_trait]
impl<T: HttpTransport, C: SettingsProvider> CommitStatusPublisher for GitlabPublisher<T, C> {
    fn id(&self) -> &str {
        GITLAB_PUBLISHER_ID
    }

    async fn build_queued(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        info: &QueueTaskInfo,
    ) -> Result<bool> {
        self.publish(
            StatusTransition::Queued,
            promotion.status_context(),
            &promotion.view_url,
            revision,
            &info.comment,
            promotion.describe(),
        )
        .await
    }

    async fn build_removed_from_queue(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
        info: &QueueTaskInfo,
    ) -> Result<bool> {
        let transition = StatusTransition::RemovedFromQueue {
            promotion_replaced: info.promotion_replaced,
        };
        self.publish(
            transition,
            promotion.status_context(),
            &promotion.view_url,
            revision,
            &info.comment,
            promotion.describe(),
        )
        .await
    }

    async fn build_started(&self, build: &Build, revision: &BuildRevision) -> Result<bool> {
        self.publish(
            StatusTransition::Started,
            build.status_context(),
            &build.view_url,
            revision,
            DefaultStatusMessages::BUILD_STARTED,
            build.describe(),
        )
        .await
    }

    async fn build_finished(&self, build: &Build, revision: &BuildRevision) -> Result<bool> {
        let transition = StatusTransition::Finished {
            successful: build.status.is_successful(),
        };
        self.publish(
            transition,
            build.status_context(),
            &build.view_url,
            revision,
            &build.status_text,
            build.describe(),
        )
        .await
    }

    async fn build_interrupted(&self, build: &Build, revision: &BuildRevision) -> Result<bool> {
        self.publish(
            StatusTransition::Interrupted,
            build.status_context(),
            &build.view_url,
            revision,
            &build.status_text,
            build.describe(),
        )
        .await
    }

    async fn build_failure_detected(&self, build: &Build, revision: &BuildRevision) -> Result<bool> {
        self.publish(
            StatusTransition::FailureDetected,
            build.status_context(),
            &build.view_url,
            revision,
            &build.status_text,
            build.describe(),
        )
        .await
    }

    async fn build_marked_as_successful(
        &self,
        build: &Build,
        revision: &BuildRevision,
        in_progress: bool,
    ) -> Result<bool> {
        self.publish(
            StatusTransition::MarkedAsSuccessful { in_progress },
            build.status_context(),
            &build.view_url,
            revision,
            DefaultStatusMessages::BUILD_MARKED_SUCCESSFUL,
            build.describe(),
        )
        .await
    }

    async fn revision_status(
        &self,
        promotion: &BuildPromotion,
        revision: &BuildRevision,
    ) -> Result<Option<RevisionStatus>> {
        self.query(promotion, revision, &promotion.view_url).await
    }

    async fn revision_status_for_removed_build(
        &self,
        removed: &QueuedBuild,
        revision: &BuildRevision,
    ) -> Result<Option<RevisionStatus>> {
        self.query(&removed.promotion, revision, &removed.view_url).await
    }
}

impl<T, C> std::fmt::Display for GitlabPublisher<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GitLab")
    }
}
