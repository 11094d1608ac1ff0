//! Resolve the GitLab project a VCS root fetches from.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PublisherError, Result};
use crate::models::repository::Repository;
use crate::models::revision::{VcsRoot, GIT_VCS_NAME};

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ssh|git|git\+ssh|http|https)://(?:[^@/]+@)?[^/:]+(?::\d+)?/(.+)$")
        .expect("valid regex")
});
static SCP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[^@/:]+@)?[^/:]+:(.+)$").expect("valid regex"));

/// Repository of a VCS root.
///
/// Roots of other VCS types are not GitLab projects and give `Ok(None)`.
/// A git root whose URL cannot be parsed is an error.
pub fn parse_repository(root: &VcsRoot, path_prefix: Option<&str>) -> Result<Option<Repository>> {
    if root.vcs_name != GIT_VCS_NAME {
        tracing::debug!(root = %root.name, vcs = %root.vcs_name, "VCS root is not a git root, skipping");
        return Ok(None);
    }

    root.property("url")
        .and_then(|url| parse_repository_url(url, path_prefix))
        .map(Some)
        .ok_or_else(|| PublisherError::UnparsableRepository {
            root: root.name.clone(),
        })
}

/// Split a git remote URL into namespace and project name.
///
/// Accepts scp-like `git@host:group/project.git` and
/// `scheme://[user@]host[:port]/group/project.git`. `path_prefix` is the
/// sub-path a self-hosted instance lives under; it is removed from the
/// front of the path when present. The last path segment is the project,
/// everything before it (subgroups included) is the namespace.
pub fn parse_repository_url(url: &str, path_prefix: Option<&str>) -> Option<Repository> {
    let url = url.trim().trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);

    let path = if url.contains("://") {
        URL_REGEX.captures(url)?.get(1)?.as_str()
    } else {
        SCP_REGEX.captures(url)?.get(1)?.as_str()
    };
    let mut path = path.trim_start_matches('/');

    let prefix = path_prefix.unwrap_or_default().trim_matches('/');
    if !prefix.is_empty() {
        if let Some(rest) = path.strip_prefix(prefix).and_then(|p| p.strip_prefix('/')) {
            path = rest;
        }
    }

    let (owner, name) = path.rsplit_once('/')?;
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(Repository::new(owner, name))
}
