//! Errors raised while publishing or querying commit statuses.

use thiserror::Error;

use crate::services::http_client::TransportError;

#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("Missing GitLab API URL parameter")]
    MissingApiUrl,

    #[error("Missing GitLab access token parameter")]
    MissingToken,

    #[error("Invalid GitLab API URL {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Cannot parse repository URL from VCS root {root}")]
    UnparsableRepository { root: String },

    #[error("GitLab request for VCS root {root} failed: {source}")]
    Transport {
        root: String,
        #[source]
        source: TransportError,
    },

    #[error("HTTP response error {status_code} {status_text}: {body}")]
    Rejected {
        status_code: u16,
        status_text: String,
        body: String,
    },

    #[error("Malformed GitLab commit status JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PublisherError {
    /// HTTP status code of a remote rejection, if this is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PublisherError::Rejected { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Short label used as the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            PublisherError::MissingApiUrl
            | PublisherError::MissingToken
            | PublisherError::InvalidApiUrl { .. }
            | PublisherError::UnparsableRepository { .. } => "configuration",
            PublisherError::Transport { .. } => "transport",
            PublisherError::Rejected { .. } => "rejected",
            PublisherError::Json(_) => "json",
            PublisherError::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, PublisherError>;
