//! Counters for commit status traffic.
//!
//! The library only records; installing an exporter is up to the host.

use metrics::counter;

use crate::models::commit_status::RemoteStatus;

/// Record a status accepted by GitLab.
pub fn status_published(state: RemoteStatus) {
    counter!("commit_status_published_total", "state" => state.as_str()).increment(1);
}

/// Record a rejection that meant GitLab already had the requested state.
pub fn benign_rejection() {
    counter!("commit_status_benign_rejections_total").increment(1);
}

/// Record a failed publish or query.
pub fn failure(kind: &'static str) {
    counter!("commit_status_failures_total", "kind" => kind).increment(1);
}

/// Record a revision status lookup.
pub fn revision_status_queried(found: bool) {
    let found = if found { "true" } else { "false" };
    counter!("commit_status_queries_total", "found" => found).increment(1);
}
