//! DingTalk robot webhook notifier

use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::AwaitError;
use crate::notify::Notifier;
use crate::utils::user_agent;

/// DingTalk robot endpoint; the key is passed as `access_token`
pub const DINGTALK_ROBOT_URL: &str = "https://oapi.dingtalk.com/robot/send";

/// `{"msgtype":"text","text":{"content":...}}`
#[derive(Debug, Clone, Serialize)]
pub struct TextMessage {
    pub msgtype: &'static str,
    pub text: TextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl TextMessage {
    pub fn new(content: String) -> Self {
        Self {
            msgtype: "text",
            text: TextContent { content },
        }
    }
}

/// Build the robot URL for a webhook key
pub fn dingtalk_webhook_url(key: &str) -> Result<Url, AwaitError> {
    Url::parse_with_params(DINGTALK_ROBOT_URL, &[("access_token", key)])
        .map_err(|e| AwaitError::ConfigError(format!("Invalid webhook URL: {}", e)))
}

/// Posts messages to a chat webhook in background tasks
///
/// Delivery tasks are kept so the driver can give them a chance to finish
/// with [`DingTalkNotifier::flush`] before the process exits.
pub struct DingTalkNotifier {
    client: Client,
    webhook_url: Option<Url>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl DingTalkNotifier {
    /// Create a notifier; `None` disables notifications
    pub fn new(webhook_url: Option<Url>) -> Result<Self, AwaitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            webhook_url,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Number of deliveries not yet awaited by `flush`
    pub fn pending(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Wait up to `grace` for in-flight deliveries
    pub async fn flush(&self, grace: Duration) {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        if handles.is_empty() {
            return;
        }

        debug!("Waiting for {} pending notification(s)...", handles.len());
        if tokio::time::timeout(grace, futures::future::join_all(handles))
            .await
            .is_err()
        {
            warn!("Notification delivery did not finish within {:?}, giving up", grace);
        }
    }
}

async fn deliver(client: Client, url: Url, message: TextMessage) -> Result<(), AwaitError> {
    let response = client.post(url).json(&message).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AwaitError::NotifyError(format!("{}: {}", status, body)));
    }

    info!("Notification sent ({})", status);
    Ok(())
}

impl Notifier for DingTalkNotifier {
    fn notify(&self, content: String) {
        let Some(url) = self.webhook_url.clone() else {
            debug!("No webhook configured, skipping notification");
            return;
        };

        let client = self.client.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = deliver(client, url, TextMessage::new(content)).await {
                error!("Failed to send notification: {}", e);
            }
        });
        match self.pending.lock() {
            Ok(mut pending) => pending.push(handle),
            Err(_) => warn!("Notification queue poisoned, delivery will not be awaited"),
        }
    }

    fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}
