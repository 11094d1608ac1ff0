//! Builds, queued builds and promotions as exposed by the build server.

use serde::{Deserialize, Serialize};

/// Final or interim status of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Normal,
    Warning,
    Failure,
    Error,
    Unknown,
}

impl BuildStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, BuildStatus::Normal | BuildStatus::Warning)
    }
}

/// A build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildType {
    pub external_id: String,
    pub name: String,
    pub project_name: String,
    /// Name including the project path, e.g. `Backend :: Unit Tests`.
    pub full_name: String,
}

impl BuildType {
    /// `"<name> (<project>)"`, the name builds are grouped under for a revision.
    pub fn context_name(&self) -> String {
        format!("{} ({})", self.name, self.project_name)
    }
}

/// A build promotion: the unit that is queued, and later becomes a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPromotion {
    pub id: u64,
    /// Absent when the build configuration has been deleted.
    pub build_type: Option<BuildType>,
    pub build_type_external_id: String,
    pub view_url: String,
}

impl BuildPromotion {
    /// Name the status is published under.
    pub fn status_context(&self) -> &str {
        self.build_type
            .as_ref()
            .map(|bt| bt.full_name.as_str())
            .unwrap_or(&self.build_type_external_id)
    }

    pub fn describe(&self) -> String {
        format!("promotion #{} of {}", self.id, self.build_type_external_id)
    }
}

/// A running or finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: u64,
    pub promotion: BuildPromotion,
    pub status: BuildStatus,
    /// Human-readable status line, e.g. `Tests failed: 3, passed: 120`.
    pub status_text: String,
    pub view_url: String,
}

impl Build {
    pub fn status_context(&self) -> &str {
        self.promotion.status_context()
    }

    pub fn build_type(&self) -> Option<&BuildType> {
        self.promotion.build_type.as_ref()
    }

    pub fn describe(&self) -> String {
        format!("build #{} of {}", self.id, self.promotion.build_type_external_id)
    }
}

/// A build still waiting in the queue, or just removed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedBuild {
    pub item_id: String,
    pub promotion: BuildPromotion,
    pub view_url: String,
}

/// Extra data delivered with queue events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTaskInfo {
    pub comment: String,
    pub comment_author: Option<String>,
    /// The promotion left the queue because a newer one replaced it.
    pub promotion_replaced: bool,
}

impl QueueTaskInfo {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            comment_author: None,
            promotion_replaced: false,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.comment_author = Some(author.into());
        self
    }

    pub fn replaced(mut self) -> Self {
        self.promotion_replaced = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promotion(build_type: Option<BuildType>) -> BuildPromotion {
        BuildPromotion {
            id: 7,
            build_type,
            build_type_external_id: "Backend_UnitTests".to_string(),
            view_url: "http://ci/viewQueued.html?itemId=7".to_string(),
        }
    }

    #[test]
    fn test_status_context_uses_full_name() {
        let bt = BuildType {
            external_id: "Backend_UnitTests".to_string(),
            name: "Unit Tests".to_string(),
            project_name: "Backend".to_string(),
            full_name: "Backend :: Unit Tests".to_string(),
        };
        assert_eq!(bt.context_name(), "Unit Tests (Backend)");
        assert_eq!(promotion(Some(bt)).status_context(), "Backend :: Unit Tests");
    }

    #[test]
    fn test_status_context_falls_back_to_external_id() {
        assert_eq!(promotion(None).status_context(), "Backend_UnitTests");
    }

    #[test]
    fn test_build_status_success() {
        assert!(BuildStatus::Normal.is_successful());
        assert!(BuildStatus::Warning.is_successful());
        assert!(!BuildStatus::Failure.is_successful());
        assert!(!BuildStatus::Error.is_successful());
        assert!(!BuildStatus::Unknown.is_successful());
    }
}
