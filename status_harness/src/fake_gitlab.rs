//! In-memory GitLab commit status API.
//!
//! Implements the two endpoints the publisher uses behind the
//! [`HttpTransport`] seam so the real [`GitlabPublisher`] can be driven end
//! to end without a network:
//!
//! - `POST /projects/:id/statuses/:sha`
//! - `GET /projects/:id/repository/commits/:sha/statuses[?name=]`
//!
//! Statuses follow GitLab's storage rules closely enough for lifecycle
//! tests: a pending or running status is moved in place, a finished one is
//! followed by a new record, and a transition into the state the status is
//! already in is refused with GitLab's own error text.
//!
//! [`GitlabPublisher`]: commit_status_publisher::GitlabPublisher

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use commit_status_publisher::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const DEFAULT_CONTEXT: &str = "default";

/// A commit status as GitLab stores and lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredStatus {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub status: String,
    pub name: String,
    pub description: Option<String>,
    pub target_url: Option<String>,
}

impl StoredStatus {
    fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "pending" | "running")
    }
}

#[derive(Debug, Deserialize)]
struct PostedStatus {
    state: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    target_url: Option<String>,
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    /// Keyed by (project path, commit); newest first.
    statuses: HashMap<(String, String), Vec<StoredStatus>>,
    requests: Vec<HttpRequest>,
    injected: VecDeque<HttpResponse>,
    offline: bool,
}

#[derive(Debug)]
pub struct FakeGitlab {
    token: String,
    state: Mutex<FakeState>,
}

enum Route {
    PostStatus { project: String, sha: String },
    ListStatuses { project: String, sha: String },
}

fn error_response(status_code: u16, message: &str) -> HttpResponse {
    HttpResponse::new(status_code, json!({ "message": message }).to_string())
}

/// Percent-decode one path segment, e.g. `acme%2Fweb` to `acme/web`.
fn decode_segment(segment: &str) -> String {
    // Project paths carry no `+`, so form decoding is equivalent here.
    url::form_urlencoded::parse(format!("s={segment}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn route(method: &str, url: &Url) -> Option<Route> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    let start = segments.iter().position(|s| *s == "projects")?;
    let project = decode_segment(segments.get(start + 1)?);

    match (method, &segments[start + 2..]) {
        ("POST", ["statuses", sha]) => Some(Route::PostStatus {
            project,
            sha: sha.to_string(),
        }),
        ("GET", ["repository", "commits", sha, "statuses"]) => Some(Route::ListStatuses {
            project,
            sha: sha.to_string(),
        }),
        _ => None,
    }
}

/// GitLab's refusal for a transition into a state the status already has.
fn refused_transition(current: &str, requested: &str) -> Option<&'static str> {
    match (current, requested) {
        ("pending", "pending") => Some("Cannot transition status via :enqueue from :pending"),
        ("running", "pending") => Some("Cannot transition status via :enqueue from :running"),
        ("running", "running") => Some("Cannot transition status via :run from :running"),
        _ => None,
    }
}

impl FakeGitlab {
    /// A fake accepting requests authenticated with `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            state: Mutex::new(FakeState {
                next_id: 1,
                ..FakeState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer the next request with `response` instead of handling it.
    pub fn fail_next(&self, response: HttpResponse) {
        self.state().injected.push_back(response);
    }

    /// While offline every request fails at the transport level.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    /// Statuses stored for `project` (e.g. `acme/web`) at `sha`, newest first.
    pub fn statuses(&self, project: &str, sha: &str) -> Vec<StoredStatus> {
        self.state()
            .statuses
            .get(&(project.to_string(), sha.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        if request.header_value(TOKEN_HEADER) != Some(self.token.as_str()) {
            return error_response(401, "401 Unauthorized");
        }
        let Ok(url) = Url::parse(&request.url) else {
            return error_response(400, "400 Bad request");
        };
        match route(request.method.as_str(), &url) {
            Some(Route::PostStatus { project, sha }) => self.post_status(project, sha, request.body.as_deref()),
            Some(Route::ListStatuses { project, sha }) => {
                let name = url.query_pairs().find(|(k, _)| k == "name").map(|(_, v)| v.into_owned());
                self.list_statuses(project, sha, name.as_deref())
            }
            None => error_response(404, "404 Not Found"),
        }
    }

    fn post_status(&self, project: String, sha: String, body: Option<&str>) -> HttpResponse {
        let Some(posted) = body.and_then(|b| serde_json::from_str::<PostedStatus>(b).ok()) else {
            return error_response(400, "400 Bad request - state is missing");
        };
        if !matches!(posted.state.as_str(), "pending" | "running" | "success" | "failed" | "canceled") {
            return error_response(400, "400 Bad request - state does not have a valid value");
        }
        let name = posted
            .context
            .or(posted.name)
            .unwrap_or_else(|| DEFAULT_CONTEXT.to_string());

        let mut state = self.state();
        let next_id = state.next_id;
        let records = state.statuses.entry((project, sha.clone())).or_default();

        if let Some(current) = records.iter_mut().find(|s| s.name == name && s.is_active()) {
            if let Some(message) = refused_transition(&current.status, &posted.state) {
                return error_response(400, message);
            }
            current.status = posted.state;
            current.description = posted.description;
            current.target_url = posted.target_url;
            current.git_ref = posted.git_ref.or(current.git_ref.take());
            let updated = json!(current).to_string();
            return HttpResponse::new(201, updated);
        }

        let stored = StoredStatus {
            id: next_id,
            sha,
            git_ref: posted.git_ref,
            status: posted.state,
            name,
            description: posted.description,
            target_url: posted.target_url,
        };
        let created = json!(stored).to_string();
        records.insert(0, stored);
        state.next_id += 1;
        HttpResponse::new(201, created)
    }

    fn list_statuses(&self, project: String, sha: String, name: Option<&str>) -> HttpResponse {
        let state = self.state();
        let mut listed: Vec<&StoredStatus> = state
            .statuses
            .get(&(project, sha))
            .map(|records| {
                records
                    .iter()
                    .filter(|s| name.map_or(true, |n| s.name == n))
                    .collect()
            })
            .unwrap_or_default();
        listed.sort_by(|a, b| b.id.cmp(&a.id));
        HttpResponse::new(200, json!(listed).to_string())
    }
}

impl Default for FakeGitlab {
    fn default() -> Self {
        Self::new("token")
    }
}

#[async_trait]
impl HttpTransport for FakeGitlab {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "Fake GitLab request");
        let injected = {
            let mut state = self.state();
            state.requests.push(request.clone());
            if state.offline {
                return Err(TransportError::Unavailable("connection refused".to_string()));
            }
            state.injected.pop_front()
        };
        Ok(injected.unwrap_or_else(|| self.handle(&request)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(url: &str, body: serde_json::Value) -> HttpRequest {
        HttpRequest::post_json(url, body.to_string()).header(TOKEN_HEADER, "token")
    }

    const POST_URL: &str = "https://gitlab.example.com/api/v4/projects/acme%2Fweb/statuses/abc123";
    const LIST_URL: &str =
        "https://gitlab.example.com/api/v4/projects/acme%2Fweb/repository/commits/abc123/statuses";

    #[tokio::test]
    async fn test_active_status_moves_in_place() {
        let gitlab = FakeGitlab::default();
        gitlab
            .send(post(POST_URL, json!({"state": "pending", "context": "ci"})))
            .await
            .unwrap();
        let response = gitlab
            .send(post(POST_URL, json!({"state": "running", "context": "ci"})))
            .await
            .unwrap();
        assert_eq!(response.status_code, 201);

        let stored = gitlab.statuses("acme/web", "abc123");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, "running");
    }

    #[tokio::test]
    async fn test_finished_status_gets_new_record() {
        let gitlab = FakeGitlab::default();
        for state in ["running", "success", "pending"] {
            gitlab
                .send(post(POST_URL, json!({"state": state, "context": "ci"})))
                .await
                .unwrap();
        }
        let stored = gitlab.statuses("acme/web", "abc123");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].status, "pending");
        assert_eq!(stored[1].status, "success");
    }

    #[tokio::test]
    async fn test_refuses_transition_into_same_state() {
        let gitlab = FakeGitlab::default();
        gitlab
            .send(post(POST_URL, json!({"state": "running", "context": "ci"})))
            .await
            .unwrap();
        let response = gitlab
            .send(post(POST_URL, json!({"state": "pending", "context": "ci"})))
            .await
            .unwrap();
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("Cannot transition status via :enqueue from :running"));
    }

    #[tokio::test]
    async fn test_list_filters_by_name() {
        let gitlab = FakeGitlab::default();
        gitlab
            .send(post(POST_URL, json!({"state": "success", "context": "lint"})))
            .await
            .unwrap();
        gitlab
            .send(post(POST_URL, json!({"state": "failed", "context": "test"})))
            .await
            .unwrap();

        let request = HttpRequest::get(format!("{LIST_URL}?name=lint")).header(TOKEN_HEADER, "token");
        let response = gitlab.send(request).await.unwrap();
        let listed: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["status"], "success");

        let all = gitlab
            .send(HttpRequest::get(LIST_URL).header(TOKEN_HEADER, "token"))
            .await
            .unwrap();
        let listed: serde_json::Value = serde_json::from_str(&all.body).unwrap();
        assert_eq!(listed[0]["name"], "test");
    }

    #[tokio::test]
    async fn test_rejects_wrong_token_and_unknown_route() {
        let gitlab = FakeGitlab::new("secret");
        let response = gitlab.send(HttpRequest::get(LIST_URL)).await.unwrap();
        assert_eq!(response.status_code, 401);

        let response = gitlab
            .send(HttpRequest::get("https://gitlab.example.com/api/v4/projects/acme%2Fweb").header(TOKEN_HEADER, "secret"))
            .await
            .unwrap();
        assert_eq!(response.status_code, 404);
        assert_eq!(gitlab.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let gitlab = FakeGitlab::default();
        gitlab.fail_next(HttpResponse::new(503, "maintenance"));
        let response = gitlab.send(HttpRequest::get(LIST_URL).header(TOKEN_HEADER, "token")).await.unwrap();
        assert_eq!(response.status_code, 503);

        gitlab.set_offline(true);
        let err = gitlab.send(HttpRequest::get(LIST_URL)).await.unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
    }
}
