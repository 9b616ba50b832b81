//! Cloudflare Pages API client tests against a local mock

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use pages_await::authn::auth_headers::AuthHeaders;
use pages_await::errors::AwaitError;
use pages_await::http::client::CloudflareClient;
use pages_await::http::deployments::DeploymentSource;

use crate::common::{closed_port_url, serve, snapshot_json};

const DEPLOYMENTS: &str = "/accounts/{account}/pages/projects/{project}/deployments";
const LOGS: &str = "/accounts/{account}/pages/projects/{project}/deployments/{id}/history/logs";

#[derive(Debug, Clone, Default)]
struct Seen {
    path: (String, String),
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
}

fn token() -> AuthHeaders {
    AuthHeaders::from_inputs(Some("cf-token".to_string()), None, None).unwrap()
}

fn client(base_url: &str, auth: AuthHeaders) -> CloudflareClient {
    CloudflareClient::new(base_url, auth, "acc", "site").unwrap()
}

/// Mock listing endpoint answering with `body`, recording the last request
async fn listing(body: serde_json::Value) -> (String, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let recorder = seen.clone();

    let router = Router::new().route(
        DEPLOYMENTS,
        get(
            move |Path(path): Path<(String, String)>,
                  Query(query): Query<HashMap<String, String>>,
                  headers: HeaderMap| {
                let body = body.clone();
                let recorder = recorder.clone();
                async move {
                    let headers = headers
                        .iter()
                        .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
                        .collect();
                    *recorder.lock().unwrap() = Seen {
                        path,
                        query,
                        headers,
                    };
                    Json(body)
                }
            },
        ),
    );

    (serve(router).await, seen)
}

fn ok_listing(deployments: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "success": true, "errors": [], "messages": [], "result": deployments })
}

#[tokio::test]
async fn test_list_sends_token_and_sorting() {
    let (url, seen) = listing(ok_listing(vec![snapshot_json("dep-1", "build", "active")])).await;
    let cf = client(&url, token());

    let deployments = cf.list_deployments().await.unwrap();
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].id, "dep-1");
    assert_eq!(deployments[0].latest_stage.name, "build");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.path, ("acc".to_string(), "site".to_string()));
    assert_eq!(seen.query.get("sort_by").map(String::as_str), Some("created_on"));
    assert_eq!(seen.query.get("sort_order").map(String::as_str), Some("desc"));
    assert_eq!(
        seen.headers.get("authorization").map(String::as_str),
        Some("Bearer cf-token")
    );
    assert!(seen
        .headers
        .get("user-agent")
        .is_some_and(|ua| ua.starts_with("pages-await/")));
}

#[tokio::test]
async fn test_list_sends_global_key() {
    let (url, seen) = listing(ok_listing(vec![])).await;
    let auth = AuthHeaders::from_inputs(
        None,
        Some("me@example.com".to_string()),
        Some("global-key".to_string()),
    )
    .unwrap();

    cf_poll(&client(&url, auth)).await;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen.headers.get("x-auth-email").map(String::as_str),
        Some("me@example.com")
    );
    assert_eq!(
        seen.headers.get("x-auth-key").map(String::as_str),
        Some("global-key")
    );
    assert!(!seen.headers.contains_key("authorization"));
}

async fn cf_poll(cf: &CloudflareClient) -> Option<String> {
    cf.poll_deployment(None, None)
        .await
        .unwrap()
        .map(|deployment| deployment.id)
}

#[tokio::test]
async fn test_poll_resolves_by_commit_hash() {
    let mut newest = snapshot_json("dep-2", "build", "active");
    newest["deployment_trigger"]["metadata"]["commit_hash"] = json!("other");
    let older = snapshot_json("dep-1", "deploy", "active");

    let (url, _) = listing(ok_listing(vec![newest, older])).await;
    let cf = client(&url, token());

    let by_hash = cf.poll_deployment(Some("abc123"), None).await.unwrap();
    assert_eq!(by_hash.map(|d| d.id).as_deref(), Some("dep-1"));

    let newest = cf.poll_deployment(None, None).await.unwrap();
    assert_eq!(newest.map(|d| d.id).as_deref(), Some("dep-2"));

    let missing = cf.poll_deployment(Some("nope"), None).await.unwrap();
    assert!(missing.is_none());

    let pinned = cf.poll_deployment(Some("other"), Some("dep-1")).await.unwrap();
    assert_eq!(pinned.map(|d| d.id).as_deref(), Some("dep-1"));
}

#[tokio::test]
async fn test_empty_listing_is_not_found() {
    let (url, _) = listing(ok_listing(vec![])).await;
    assert_eq!(cf_poll(&client(&url, token())).await, None);
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_api_error() {
    let (url, _) = listing(json!({
        "success": false,
        "errors": [{ "code": 10000, "message": "Authentication error" }],
        "result": null
    }))
    .await;

    let err = client(&url, token())
        .poll_deployment(None, None)
        .await
        .unwrap_err();

    match err {
        AwaitError::ApiError(message) => {
            assert!(message.starts_with("Failed to check deployment status! Error: "));
            assert!(message.contains("Authentication error"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let router = Router::new().route(
        DEPLOYMENTS,
        get(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let url = serve(router).await;

    let err = client(&url, token())
        .poll_deployment(None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AwaitError::InvalidResponse { status: 502, .. }));
}

#[tokio::test]
async fn test_unreachable_api_is_http_error() {
    let url = closed_port_url().await;
    let err = client(&url, token())
        .poll_deployment(None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AwaitError::HttpError(_)));
}

#[tokio::test]
async fn test_log_tail_keeps_last_lines() {
    let router = Router::new().route(
        LOGS,
        get(|Path((_, _, id)): Path<(String, String, String)>| async move {
            let data: Vec<_> = (1..=25)
                .map(|i| json!({ "ts": "2024-05-01T10:00:00Z", "line": format!("{} line {}", id, i) }))
                .collect();
            Json(json!({
                "success": true,
                "errors": [],
                "result": { "total": 25, "data": data }
            }))
        }),
    );
    let url = serve(router).await;

    let tail = client(&url, token()).log_tail("dep-1").await;

    let expected: Vec<String> = (6..=25).map(|i| format!("dep-1 line {}", i)).collect();
    assert_eq!(tail, format!("```{}\n```", expected.join("\n")));
}

#[tokio::test]
async fn test_log_tail_swallows_errors() {
    let router = Router::new().route(
        LOGS,
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
    );
    let url = serve(router).await;
    let cf = client(&url, token());

    assert_eq!(cf.log_tail("dep-1").await, "");

    let err = cf.get_deployment_logs("dep-1").await.unwrap_err();
    assert!(matches!(err, AwaitError::InvalidResponse { status: 500, .. }));
}
