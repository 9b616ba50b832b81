//! Webhook notifier tests against a local mock

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::Query;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use pages_await::notify::dingtalk::DingTalkNotifier;
use pages_await::notify::Notifier;

use crate::common::serve;

type Received = Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>;

async fn robot(delay: Duration) -> (Url, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let recorder = received.clone();

    let router = Router::new().route(
        "/robot/send",
        post(
            move |Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    recorder.lock().unwrap().push((query, body));
                    Json(json!({ "errcode": 0, "errmsg": "ok" }))
                }
            },
        ),
    );

    let base = serve(router).await;
    let url = Url::parse_with_params(&format!("{}/robot/send", base), &[("access_token", "key-1")])
        .unwrap();
    (url, received)
}

#[tokio::test]
async fn test_flush_delivers_text_payload() {
    let (url, received) = robot(Duration::ZERO).await;
    let notifier = DingTalkNotifier::new(Some(url)).unwrap();
    assert!(notifier.is_enabled());

    notifier.notify("✅ deployed".to_string());
    assert_eq!(notifier.pending(), 1);

    notifier.flush(Duration::from_secs(10)).await;
    assert_eq!(notifier.pending(), 0);

    let received = received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let (query, body) = &received[0];
    assert_eq!(query.get("access_token").map(String::as_str), Some("key-1"));
    assert_eq!(
        *body,
        json!({ "msgtype": "text", "text": { "content": "✅ deployed" } })
    );
}

#[tokio::test]
async fn test_flush_gives_up_after_grace() {
    let (url, received) = robot(Duration::from_secs(5)).await;
    let notifier = DingTalkNotifier::new(Some(url)).unwrap();

    notifier.notify("slow".to_string());

    let started = Instant::now();
    notifier.flush(Duration::from_millis(100)).await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_webhook_does_not_panic() {
    let url = Url::parse("http://127.0.0.1:9/robot/send?access_token=x").unwrap();
    let notifier = DingTalkNotifier::new(Some(url)).unwrap();

    notifier.notify("lost".to_string());
    notifier.flush(Duration::from_secs(10)).await;
    assert_eq!(notifier.pending(), 0);
}
