//! GitlabPublisher over the reqwest transport against a mock GitLab.

use std::time::Duration;

use commit_status_publisher::{
    Build, BuildPromotion, BuildRevision, BuildStatus, BuildType, CommitStatusPublisher, GitlabPublisher,
    LifecycleEvent, PublisherError, PublisherSettings, QueueTaskInfo, ReqwestTransport, VcsRoot,
};
use httpmock::prelude::*;
use serde_json::json;

fn publisher(server: &MockServer) -> GitlabPublisher<ReqwestTransport, PublisherSettings> {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).expect("client");
    let settings = PublisherSettings::new(server.url("/api/v4"), "secret");
    GitlabPublisher::new(transport, settings)
}

fn promotion() -> BuildPromotion {
    BuildPromotion {
        id: 3,
        build_type: Some(BuildType {
            external_id: "Web_Build".to_string(),
            name: "Build".to_string(),
            project_name: "Web".to_string(),
            full_name: "Web :: Build".to_string(),
        }),
        build_type_external_id: "Web_Build".to_string(),
        view_url: "http://ci/viewQueued.html?itemId=3".to_string(),
    }
}

fn build() -> Build {
    Build {
        id: 30,
        promotion: promotion(),
        status: BuildStatus::Normal,
        status_text: "Success".to_string(),
        view_url: "http://ci/build/30".to_string(),
    }
}

fn revision() -> BuildRevision {
    BuildRevision {
        root: VcsRoot::git("Web", "https://gitlab.example.com/acme/web.git"),
        revision: "abc123".to_string(),
        vcs_branch: Some("refs/heads/main".to_string()),
    }
}

#[tokio::test]
async fn integration_publishes_status_with_token() {
    let server = MockServer::start();
    let post = server.mock(|when, then| {
        when.method(POST)
            .path_contains("/projects/")
            .path_contains("/statuses/abc123")
            .header("private-token", "secret")
            .header("content-type", "application/json")
            .body_contains("\"state\":\"pending\"")
            .body_contains("\"description\":\"Triggered by push\"")
            .body_contains("\"ref\":\"main\"");
        then.status(201).json_body(json!({"id": 1, "status": "pending"}));
    });

    let handled = publisher(&server)
        .build_queued(&promotion(), &revision(), &QueueTaskInfo::new("Triggered by push"))
        .await
        .expect("publish");
    assert!(handled);
    post.assert();
}

#[tokio::test]
async fn integration_duplicate_transition_is_absorbed() {
    let server = MockServer::start();
    let post = server.mock(|when, then| {
        when.method(POST).path_contains("/statuses/abc123");
        then.status(400)
            .json_body(json!({"message": "Cannot transition status via :run from :running"}));
    });

    let publisher = publisher(&server);
    assert!(publisher.build_started(&build(), &revision()).await.expect("first"));
    assert!(publisher.build_started(&build(), &revision()).await.expect("second"));
    post.assert_hits(2);
}

#[tokio::test]
async fn integration_other_rejection_carries_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("/statuses/abc123");
        then.status(409).body("ref is locked");
    });

    let err = publisher(&server)
        .build_finished(&build(), &revision())
        .await
        .expect_err("should fail");
    match err {
        PublisherError::Rejected {
            status_code,
            status_text,
            body,
        } => {
            assert_eq!(status_code, 409);
            assert_eq!(status_text, "Conflict");
            assert_eq!(body, "ref is locked");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn integration_revision_status_reads_latest_record() {
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET)
            .path_contains("/repository/commits/abc123/statuses")
            .query_param_exists("name")
            .header("private-token", "secret");
        then.status(200).json_body(json!([
            {"id": 9, "status": "pending", "name": "Web :: Build",
             "description": "Triggered by push", "target_url": "http://ci/viewQueued.html?itemId=3"},
            {"id": 8, "status": "success", "name": "Web :: Build",
             "description": "Success", "target_url": "http://ci/build/29"}
        ]));
    });

    let status = publisher(&server)
        .revision_status(&promotion(), &revision())
        .await
        .expect("query")
        .expect("status present");
    assert_eq!(status.event, Some(LifecycleEvent::Queued));
    assert_eq!(status.description.as_deref(), Some("Triggered by push"));
    assert!(status.is_last_for_revision);
    get.assert();
}

#[tokio::test]
async fn integration_malformed_statuses_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("/statuses");
        then.status(200).body("<html>maintenance</html>");
    });

    let err = publisher(&server)
        .revision_status(&promotion(), &revision())
        .await
        .expect_err("should fail");
    assert!(matches!(err, PublisherError::Json(_)));
}

#[tokio::test]
async fn integration_unreachable_server_is_transport_error() {
    let transport = ReqwestTransport::new(Duration::from_secs(2)).expect("client");
    let publisher = GitlabPublisher::new(transport, PublisherSettings::new("http://127.0.0.1:9/api/v4", "secret"));

    let err = publisher
        .build_started(&build(), &revision())
        .await
        .expect_err("should fail");
    assert!(matches!(err, PublisherError::Transport { ref root, .. } if root == "Web"));
}
