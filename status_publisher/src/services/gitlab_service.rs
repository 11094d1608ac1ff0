//! GitLab commit status API: URLs, requests and response classification.

use url::Url;

use crate::error::{PublisherError, Result};
use crate::models::commit_status::{PublishCommitStatus, ReceivedCommitStatus};
use crate::models::repository::Repository;
use crate::services::http_client::{HttpRequest, HttpResponse, HttpTransport};

pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Error bodies GitLab returns when asked for a transition into the state
/// the status is already in. Duplicate or racing events produce these.
const ALREADY_IN_STATE_ERRORS: [&str; 3] = [
    "Cannot transition status via :enqueue from :pending",
    "Cannot transition status via :enqueue from :running",
    "Cannot transition status via :run from :running",
];

/// Connection details for one GitLab call.
#[derive(Debug, Clone, Copy)]
pub struct GitlabTarget<'a> {
    pub api_url: &'a str,
    pub token: &'a str,
    pub repository: &'a Repository,
    /// VCS root name, for error messages.
    pub root_name: &'a str,
}

/// `<api>/projects/<url-encoded namespace/name>`.
pub fn projects_url(api_url: &str, repository: &Repository) -> Result<Url> {
    let invalid = |reason: String| PublisherError::InvalidApiUrl {
        url: api_url.to_string(),
        reason,
    };
    let mut url = Url::parse(api_url).map_err(|e| invalid(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| invalid("URL cannot have a path".to_string()))?;
        segments.pop_if_empty().push("projects").push(&repository.full_path());
    }
    Ok(url)
}

/// Endpoint statuses are posted to.
pub fn publish_url(api_url: &str, repository: &Repository, commit: &str) -> Result<Url> {
    let mut url = projects_url(api_url, repository)?;
    url.path_segments_mut()
        .map_err(|_| PublisherError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: "URL cannot have a path".to_string(),
        })?
        .extend(["statuses", commit]);
    Ok(url)
}

/// Endpoint listing a commit's statuses, newest first, optionally only
/// those recorded under `context`.
pub fn commit_statuses_url(
    api_url: &str,
    repository: &Repository,
    commit: &str,
    context: Option<&str>,
) -> Result<Url> {
    let mut url = projects_url(api_url, repository)?;
    url.path_segments_mut()
        .map_err(|_| PublisherError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: "URL cannot have a path".to_string(),
        })?
        .extend(["repository", "commits", commit, "statuses"]);
    if let Some(context) = context {
        url.query_pairs_mut().append_pair("name", context);
    }
    Ok(url)
}

/// Accept any response below 400, and the "already in that state"
/// rejections. Everything else is an error carrying the response.
pub fn classify_response(response: &HttpResponse) -> Result<()> {
    if response.status_code < 400 {
        return Ok(());
    }

    if ALREADY_IN_STATE_ERRORS.iter().any(|marker| response.body.contains(marker)) {
        tracing::debug!(
            status = response.status_code,
            body = %response.body,
            "GitLab already holds the requested status, ignoring rejection"
        );
        crate::metrics::benign_rejection();
        return Ok(());
    }

    Err(PublisherError::Rejected {
        status_code: response.status_code,
        status_text: response.status_text.clone(),
        body: response.body.clone(),
    })
}

/// Post a commit status.
pub async fn post_status<T: HttpTransport + ?Sized>(
    transport: &T,
    target: GitlabTarget<'_>,
    commit: &str,
    message: &PublishCommitStatus,
) -> Result<()> {
    let url = publish_url(target.api_url, target.repository, commit)?;
    let body = message.to_json()?;
    tracing::debug!(url = %url, message = %body, "Posting GitLab commit status");

    let request = HttpRequest::post_json(url.as_str(), body)
        .header(PRIVATE_TOKEN_HEADER, target.token);
    let response = transport
        .send(request)
        .await
        .map_err(|source| PublisherError::Transport {
            root: target.root_name.to_string(),
            source,
        })?;

    classify_response(&response)
}

/// Latest status GitLab holds for `commit`, or `None` when there is none.
pub async fn latest_status<T: HttpTransport + ?Sized>(
    transport: &T,
    target: GitlabTarget<'_>,
    commit: &str,
    context: Option<&str>,
) -> Result<Option<ReceivedCommitStatus>> {
    let url = commit_statuses_url(target.api_url, target.repository, commit, context)?;
    tracing::debug!(url = %url, "Fetching GitLab commit statuses");

    let request = HttpRequest::get(url.as_str()).header(PRIVATE_TOKEN_HEADER, target.token);
    let response = transport
        .send(request)
        .await
        .map_err(|source| PublisherError::Transport {
            root: target.root_name.to_string(),
            source,
        })?;
    classify_response(&response)?;

    if response.body.trim().is_empty() {
        return Ok(None);
    }
    let statuses: Vec<ReceivedCommitStatus> = serde_json::from_str(&response.body)?;
    Ok(statuses.into_iter().next())
}
