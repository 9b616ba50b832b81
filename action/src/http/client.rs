//! Cloudflare API client

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::authn::auth_headers::AuthHeaders;
use crate::errors::AwaitError;
use crate::models::api::ApiEnvelope;
use crate::utils::user_agent;

/// Default Cloudflare v4 API base URL
pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";

/// HTTP client for one Pages project
pub struct CloudflareClient {
    client: Client,
    base_url: String,
    auth: AuthHeaders,
    account_id: String,
    project: String,
}

impl CloudflareClient {
    /// Create a new client
    pub fn new(
        base_url: &str,
        auth: AuthHeaders,
        account_id: &str,
        project: &str,
    ) -> Result<Self, AwaitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            account_id: account_id.to_string(),
            project: project.to_string(),
        })
    }

    /// Path of the Pages project, relative to the base URL
    pub(crate) fn project_path(&self) -> String {
        format!(
            "/accounts/{}/pages/projects/{}",
            self.account_id, self.project
        )
    }

    /// Send an authenticated GET request
    pub(crate) async fn send(&self, path: &str) -> Result<Response, AwaitError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} ({})", url, self.auth.kind());

        let response = self.auth.apply(self.client.get(&url)).send().await.map_err(|e| {
            error!("Failed to send request to the CF API, network problem? {}", e);
            AwaitError::HttpError(e)
        })?;

        Ok(response)
    }

    /// Decode a v4 envelope, whatever the HTTP status
    ///
    /// Cloudflare reports API failures as JSON bodies with `success: false`,
    /// so only a body that is not JSON at all is an error here.
    pub(crate) async fn read_envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<ApiEnvelope<T>, AwaitError> {
        let status = response.status();
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            error!(
                "CF API did not return JSON (possibly down?) - status: {} ({})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            );
            AwaitError::InvalidResponse {
                status: status.as_u16(),
                message: e.to_string(),
            }
        })
    }

    /// Make a GET request and decode the envelope
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiEnvelope<T>, AwaitError> {
        let response = self.send(path).await?;
        Self::read_envelope(response).await
    }
}
