//! GitHub deployment mirror tests against a local mock

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};

use pages_await::errors::AwaitError;
use pages_await::github::mirror::{GithubMirror, RepoRef, StatusMirror};
use pages_await::models::github::MirrorState;

use crate::common::{serve, snapshot};

#[derive(Debug, Clone)]
struct Call {
    path: String,
    authorization: Option<String>,
    accept: Option<String>,
    api_version: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockGithub {
    calls: Arc<Mutex<Vec<Call>>>,
    // Number of deployment creations answered with 202 before succeeding
    accepted_first: Arc<AtomicUsize>,
}

impl MockGithub {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, uri: &Uri, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.calls.lock().unwrap().push(Call {
            path: uri.path().to_string(),
            authorization: header("authorization"),
            accept: header("accept"),
            api_version: header("x-github-api-version"),
            body,
        });
    }
}

async fn create_deployment(
    State(mock): State<MockGithub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(&uri, &headers, body);
    let pending = mock.accepted_first.load(Ordering::SeqCst);
    if pending > 0 {
        mock.accepted_first.store(pending - 1, Ordering::SeqCst);
        return (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Auto-merged main into topic on deployment." })),
        );
    }
    (StatusCode::CREATED, Json(json!({ "id": 42, "sha": "abc123" })))
}

async fn create_status(
    State(mock): State<MockGithub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(&uri, &headers, body);
    (StatusCode::CREATED, Json(json!({ "id": 7 })))
}

async fn start(mock: MockGithub) -> String {
    let router = Router::new()
        .route("/repos/{owner}/{repo}/deployments", post(create_deployment))
        .route(
            "/repos/{owner}/{repo}/deployments/{id}/statuses",
            post(create_status),
        )
        .with_state(mock);
    serve(router).await
}

fn mirror(url: &str, repository: Option<RepoRef>) -> GithubMirror {
    GithubMirror::new(
        url,
        Some(SecretString::from("gh-token".to_string())),
        repository,
        "acc",
    )
    .unwrap()
}

fn repo() -> Option<RepoRef> {
    Some("octo/site".parse().unwrap())
}

#[tokio::test]
async fn test_creates_record_once_and_posts_final_status() {
    let mock = MockGithub::default();
    let url = start(mock.clone()).await;
    let mut mirror = mirror(&url, repo());
    assert!(mirror.is_enabled());

    mirror
        .update(&snapshot("dep-1", "build", "active"), MirrorState::InProgress)
        .await
        .unwrap();
    assert_eq!(mirror.record_id(), Some(42));
    assert_eq!(mock.calls().len(), 1);

    mirror
        .update(&snapshot("dep-1", "deploy", "success"), MirrorState::Success)
        .await
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);

    let create = &calls[0];
    assert_eq!(create.path, "/repos/octo/site/deployments");
    assert_eq!(create.authorization.as_deref(), Some("Bearer gh-token"));
    assert_eq!(create.accept.as_deref(), Some("application/vnd.github+json"));
    assert_eq!(create.api_version.as_deref(), Some("2022-11-28"));
    assert_eq!(
        create.body,
        json!({
            "ref": "abc123",
            "auto_merge": false,
            "environment": "Production",
            "production_environment": true,
            "description": "Cloudflare Pages",
            "required_contexts": []
        })
    );

    let status = &calls[1];
    assert_eq!(status.path, "/repos/octo/site/deployments/42/statuses");
    assert_eq!(
        status.body,
        json!({
            "state": "success",
            "environment": "Production",
            "environment_url": "https://dep-1.site.pages.dev",
            "log_url": "https://dash.cloudflare.com?to=/acc/pages/view/site/dep-1",
            "description": "Cloudflare Pages"
        })
    );
}

#[tokio::test]
async fn test_failed_build_only_creates_record() {
    let mock = MockGithub::default();
    let url = start(mock.clone()).await;
    let mut mirror = mirror(&url, repo());

    mirror
        .update(&snapshot("dep-1", "build", "failed"), MirrorState::Failure)
        .await
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/repos/octo/site/deployments");
}

#[tokio::test]
async fn test_failed_deploy_posts_failure() {
    let mock = MockGithub::default();
    let url = start(mock.clone()).await;
    let mut mirror = mirror(&url, repo());

    mirror
        .update(&snapshot("dep-1", "deploy", "failed"), MirrorState::Failure)
        .await
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].body["state"], "failure");
}

#[tokio::test]
async fn test_accepted_without_id_is_retried() {
    let mock = MockGithub::default();
    mock.accepted_first.store(1, Ordering::SeqCst);
    let url = start(mock.clone()).await;
    let mut mirror = mirror(&url, repo());
    let deployment = snapshot("dep-1", "queued", "active");

    let err = mirror
        .update(&deployment, MirrorState::InProgress)
        .await
        .unwrap_err();
    match err {
        AwaitError::GitHubError(message) => assert!(message.contains("Auto-merged")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(mirror.record_id(), None);

    mirror
        .update(&deployment, MirrorState::InProgress)
        .await
        .unwrap();
    assert_eq!(mirror.record_id(), Some(42));
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test]
async fn test_preview_environment_name() {
    let mock = MockGithub::default();
    let url = start(mock.clone()).await;
    let mut mirror = mirror(&url, repo());

    let mut preview = snapshot("dep-1", "deploy", "success");
    preview.environment = "preview".to_string().into();
    mirror.update(&preview, MirrorState::Success).await.unwrap();

    let calls = mock.calls();
    assert_eq!(calls[0].body["environment"], "Preview (main)");
    assert_eq!(calls[0].body["production_environment"], false);
    assert_eq!(calls[1].body["environment"], "Preview (main)");
}

#[tokio::test]
async fn test_missing_repository_is_an_error() {
    let mock = MockGithub::default();
    let url = start(mock.clone()).await;
    let mut mirror = mirror(&url, None);

    let err = mirror
        .update(&snapshot("dep-1", "build", "active"), MirrorState::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, AwaitError::GitHubError(_)));
    assert!(mock.calls().is_empty());
}
