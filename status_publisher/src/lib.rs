//! Commit status publisher: reports CI build lifecycle to GitLab.
//!
//! Lifecycle events raised by the build server (queued, started, finished,
//! interrupted, ...) are translated into GitLab commit statuses and posted
//! against the build's revision. The reverse direction reads back the latest
//! status GitLab holds for a revision and infers which event produced it and
//! whether it still belongs to the build attempt being asked about.
//!
//! The build server model, credential storage and HTTP transport are
//! collaborators passed in explicitly; see [`models`], [`config`] and
//! [`services::http_client`].

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod models;
pub mod publisher;
pub mod services;

pub use config::{EnvSettings, PublisherSettings, SettingsProvider};
pub use error::{PublisherError, Result};
pub use events::lifecycle::{LifecycleEvent, StatusTransition};
pub use models::build::{Build, BuildPromotion, BuildStatus, BuildType, QueueTaskInfo, QueuedBuild};
pub use models::commit_status::{PublishCommitStatus, ReceivedCommitStatus, RemoteStatus, RevisionStatus};
pub use models::repository::Repository;
pub use models::revision::{BuildRevision, VcsRoot};
pub use publisher::{CommitStatusPublisher, GitlabPublisher};
pub use services::http_client::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
