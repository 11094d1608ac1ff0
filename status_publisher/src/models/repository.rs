use std::fmt;

/// A GitLab project, addressed by namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    /// Namespace; nested groups are joined with `/`.
    pub owner: String,
    pub repository_name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, repository_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository_name: repository_name.into(),
        }
    }

    pub fn full_path(&self) -> String {
        format!("{}/{}", self.owner, self.repository_name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repository_name)
    }
}
