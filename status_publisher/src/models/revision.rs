//! VCS roots and the revisions builds run against.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// VCS system identifier of git roots.
pub const GIT_VCS_NAME: &str = "jetbrains.git";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsRoot {
    pub name: String,
    pub vcs_name: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl VcsRoot {
    /// A git root fetching from `url`.
    pub fn git(name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut properties = HashMap::new();
        properties.insert("url".to_string(), url.into());
        Self {
            name: name.into(),
            vcs_name: GIT_VCS_NAME.to_string(),
            properties,
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRevision {
    pub root: VcsRoot,
    /// Commit SHA.
    pub revision: String,
    /// Full ref, e.g. `refs/heads/main`.
    pub vcs_branch: Option<String>,
}
