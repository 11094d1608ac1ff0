//! Publisher configuration: GitLab API URL and access token.
//!
//! Settings are looked up on every publish call, so a changed token or URL
//! takes effect on the next event without rebuilding the publisher.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Build feature parameter holding the GitLab API URL.
pub const GITLAB_API_URL_PARAM: &str = "gitlabApiUrl";
/// Build feature parameter holding the access token.
pub const GITLAB_TOKEN_PARAM: &str = "secure:gitlabAccessToken";

static API_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^/]+(/.*)?/api/v\d+/?$").expect("valid regex")
});

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublisherSettings {
    /// GitLab API root, e.g. `https://gitlab.example.com/api/v4`.
    pub api_url: Option<String>,
    /// Token sent as `PRIVATE-TOKEN`.
    pub token: Option<String>,
}

impl PublisherSettings {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: Some(api_url.into()),
            token: Some(token.into()),
        }
    }

    /// Load from build feature parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            api_url: params.get(GITLAB_API_URL_PARAM).cloned(),
            token: params.get(GITLAB_TOKEN_PARAM).cloned(),
        }
    }

    /// Load from `GITLAB_API_URL` and `GITLAB_TOKEN`.
    pub fn from_env() -> Self {
        let api_url = std::env::var("GITLAB_API_URL").ok().filter(|s| !s.is_empty());
        let token = std::env::var("GITLAB_TOKEN").ok().filter(|s| !s.is_empty());

        if api_url.is_none() {
            tracing::warn!("GITLAB_API_URL not set -- commit status publishing will fail");
        }
        if token.is_none() {
            tracing::warn!("GITLAB_TOKEN not set -- commit status publishing will fail");
        }

        Self { api_url, token }
    }

    /// API URL without trailing slashes; `None` when unset or blank.
    pub fn api_url(&self) -> Option<&str> {
        self.api_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Sub-path a self-hosted GitLab is mounted under, taken from the API URL.
    pub fn path_prefix(&self) -> Option<String> {
        self.api_url().and_then(path_prefix)
    }
}

/// Path in front of `/api/vN` in a GitLab API URL.
///
/// `https://host/gitlab/api/v4` gives `/gitlab`, `https://host/api/v4` gives
/// an empty prefix; a URL without the API suffix gives `None`.
pub fn path_prefix(api_url: &str) -> Option<String> {
    API_SUFFIX_REGEX
        .captures(api_url)
        .map(|caps| caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())
}

/// Source of settings, consulted once per publish call.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> PublisherSettings;
}

impl SettingsProvider for PublisherSettings {
    fn settings(&self) -> PublisherSettings {
        self.clone()
    }
}

/// Reads the environment on every call.
#[derive(Clone, Debug, Default)]
pub struct EnvSettings;

impl SettingsProvider for EnvSettings {
    fn settings(&self) -> PublisherSettings {
        PublisherSettings::from_env()
    }
}
