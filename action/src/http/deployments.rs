//! Pages deployment API client

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::AwaitError;
use crate::http::client::CloudflareClient;
use crate::models::api::{ApiEnvelope, LogEntry, LogHistory};
use crate::models::deployment::Deployment;

/// Number of build log lines kept for notifications
pub const LOG_TAIL_LINES: usize = 20;

/// Fence wrapped around the rendered log tail
pub const LOG_FENCE: &str = "```";

/// Where the polling loop gets deployment snapshots from
#[async_trait]
pub trait DeploymentSource: Send + Sync {
    /// Fetch one snapshot of the deployment relevant to this run
    ///
    /// `Ok(None)` means "not there yet, keep waiting"; any `Err` ends the run.
    async fn poll_deployment(
        &self,
        commit_hash: Option<&str>,
        pinned_id: Option<&str>,
    ) -> Result<Option<Deployment>, AwaitError>;

    /// Rendered tail of the build logs, or an empty string on any failure
    async fn log_tail(&self, deployment_id: &str) -> String;
}

impl CloudflareClient {
    /// List the project's deployments, newest first
    pub async fn list_deployments(&self) -> Result<Vec<Deployment>, AwaitError> {
        let path = format!(
            "{}/deployments?sort_by=created_on&sort_order=desc",
            self.project_path()
        );
        let envelope: ApiEnvelope<Vec<Deployment>> = self.get(&path).await?;

        if !envelope.success {
            return Err(AwaitError::ApiError(format!(
                "Failed to check deployment status! Error: {}",
                envelope.first_error()
            )));
        }

        Ok(envelope.result.unwrap_or_default())
    }

    /// Get the build log history of a deployment
    pub async fn get_deployment_logs(&self, deployment_id: &str) -> Result<Vec<LogEntry>, AwaitError> {
        let path = format!(
            "{}/deployments/{}/history/logs",
            self.project_path(),
            deployment_id
        );
        let response = self.send(&path).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AwaitError::InvalidResponse {
                status: status.as_u16(),
                message: format!(
                    "Unable to fetch Cloudflare logs ({})",
                    status.canonical_reason().unwrap_or("unknown")
                ),
            });
        }

        let envelope: ApiEnvelope<LogHistory> = Self::read_envelope(response).await?;
        if !envelope.success {
            return Err(AwaitError::ApiError(envelope.first_error()));
        }

        let history = envelope.result.unwrap_or_default();
        debug!(
            "Fetched {} of {} log lines for deployment {}",
            history.data.len(),
            history.total.unwrap_or(history.data.len() as u64),
            deployment_id
        );
        Ok(history.data)
    }
}

#[async_trait]
impl DeploymentSource for CloudflareClient {
    async fn poll_deployment(
        &self,
        commit_hash: Option<&str>,
        pinned_id: Option<&str>,
    ) -> Result<Option<Deployment>, AwaitError> {
        let deployments = self.list_deployments().await?;
        debug!("Listed {} deployments", deployments.len());
        Ok(resolve_deployment(deployments, commit_hash, pinned_id))
    }

    async fn log_tail(&self, deployment_id: &str) -> String {
        match self.get_deployment_logs(deployment_id).await {
            Ok(entries) => render_log_tail(&entries),
            Err(e) => {
                warn!("Unable to fetch Cloudflare logs: {}", e);
                String::new()
            }
        }
    }
}

/// Pick the deployment this run tracks out of a newest-first listing
///
/// A pinned id wins over everything else. Without one, the newest deployment
/// is used, or the newest one built from `commit_hash` when given.
pub fn resolve_deployment(
    deployments: Vec<Deployment>,
    commit_hash: Option<&str>,
    pinned_id: Option<&str>,
) -> Option<Deployment> {
    let mut deployments = deployments.into_iter();

    if let Some(id) = pinned_id {
        return deployments.find(|d| d.id == id);
    }

    match commit_hash {
        None => deployments.next(),
        Some(hash) => deployments.find(|d| d.commit_hash() == Some(hash)),
    }
}

/// Render the last log lines as one fenced block
pub fn render_log_tail(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let start = entries.len().saturating_sub(LOG_TAIL_LINES);
    let lines: Vec<&str> = entries[start..].iter().map(|e| e.line.as_str()).collect();

    format!("{}{}\n{}", LOG_FENCE, lines.join("\n"), LOG_FENCE)
}
