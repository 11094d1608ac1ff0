//! GitLab commit status payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::lifecycle::LifecycleEvent;

/// Commit status states understood by GitLab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
}

impl RemoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteStatus::Pending => "pending",
            RemoteStatus::Running => "running",
            RemoteStatus::Success => "success",
            RemoteStatus::Failed => "failed",
            RemoteStatus::Canceled => "canceled",
        }
    }

    /// Looks up a status by its wire name. GitLab may add states, so unknown
    /// names are not an error.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(RemoteStatus::Pending),
            "running" => Some(RemoteStatus::Running),
            "success" => Some(RemoteStatus::Success),
            "failed" => Some(RemoteStatus::Failed),
            "canceled" => Some(RemoteStatus::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /projects/:id/statuses/:sha`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishCommitStatus {
    pub state: RemoteStatus,
    pub description: String,
    /// Build name the status is recorded under; GitLab reports it back as `name`.
    pub context: String,
    pub target_url: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none", default)]
    pub git_ref: Option<String>,
}

impl PublishCommitStatus {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One element of `GET /projects/:id/repository/commits/:sha/statuses`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedCommitStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// What we last reported for a revision, reconstructed from GitLab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionStatus {
    /// Event that produced the status, when it can be inferred.
    pub event: Option<LifecycleEvent>,
    pub description: Option<String>,
    /// The status was published for the build being asked about, not for
    /// an earlier or later attempt on the same revision.
    pub is_last_for_revision: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_payload_omits_missing_ref() {
        let status = PublishCommitStatus {
            state: RemoteStatus::Running,
            description: "Build started".to_string(),
            context: "Backend :: Unit Tests".to_string(),
            target_url: "http://ci/build/1".to_string(),
            git_ref: None,
        };
        let value: serde_json::Value = serde_json::from_str(&status.to_json().unwrap()).unwrap();
        assert_eq!(value["state"], "running");
        assert_eq!(value["context"], "Backend :: Unit Tests");
        assert!(value.get("ref").is_none());
    }

    #[test]
    fn test_received_status_ignores_unknown_fields() {
        let json = r#"[{"id":93,"sha":"abc123","status":"success","name":"ci","description":null,
            "target_url":"http://ci/build/1","allow_failure":false}]"#;
        let statuses: Vec<ReceivedCommitStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(statuses[0].status.as_deref(), Some("success"));
        assert_eq!(statuses[0].description, None);
    }

    #[test]
    fn test_remote_status_names() {
        for status in [
            RemoteStatus::Pending,
            RemoteStatus::Running,
            RemoteStatus::Success,
            RemoteStatus::Failed,
            RemoteStatus::Canceled,
        ] {
            assert_eq!(RemoteStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(RemoteStatus::from_name("skipped"), None);
    }
}
