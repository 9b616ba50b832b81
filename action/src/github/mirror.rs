//! Mirrors the Pages deployment into GitHub's deployment API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AwaitError;
use crate::models::deployment::{Deployment, Environment};
use crate::models::github::{
    CreateDeploymentRequest, CreateDeploymentStatusRequest, GithubDeploymentRecord, MirrorState,
};
use crate::utils::user_agent;

/// Default GitHub REST API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Description attached to the GitHub deployment and its statuses
pub const DEPLOYMENT_DESCRIPTION: &str = "Cloudflare Pages";

/// Sink for deployment state transitions
#[async_trait]
pub trait StatusMirror: Send {
    /// Record `state` for the given snapshot
    async fn update(&mut self, deployment: &Deployment, state: MirrorState) -> Result<(), AwaitError>;
}

/// `owner/repo` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::str::FromStr for RepoRef {
    type Err = AwaitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(RepoRef {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(AwaitError::ConfigError(format!(
                "Invalid repository (expected owner/repo): {}",
                s
            ))),
        }
    }
}

/// GitHub environment name for a Pages deployment
pub fn environment_name(deployment: &Deployment) -> String {
    match deployment.environment {
        Environment::Production => "Production".to_string(),
        _ => format!("Preview ({})", deployment.branch().unwrap_or("unknown")),
    }
}

/// GitHub deployment mirror
///
/// Creates at most one GitHub deployment per run and remembers its id for
/// every later status.
pub struct GithubMirror {
    client: Client,
    api_url: String,
    token: Option<SecretString>,
    repository: Option<RepoRef>,
    account_id: String,
    record_id: Option<u64>,
}

impl GithubMirror {
    /// Create a new mirror; without a token every update is a no-op
    pub fn new(
        api_url: &str,
        token: Option<SecretString>,
        repository: Option<RepoRef>,
        account_id: &str,
    ) -> Result<Self, AwaitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            repository,
            account_id: account_id.to_string(),
            record_id: None,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Id of the GitHub deployment created by this run, if any
    pub fn record_id(&self) -> Option<u64> {
        self.record_id
    }

    fn request(&self, token: &SecretString, url: &str) -> RequestBuilder {
        self.client
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn post<B: Serialize>(
        &self,
        token: &SecretString,
        path: &str,
        body: &B,
    ) -> Result<GithubDeploymentRecord, AwaitError> {
        let url = format!("{}{}", self.api_url, path);
        debug!("POST {}", url);

        let response = self.request(token, &url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AwaitError::GitHubError(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }

    async fn create_deployment(
        &self,
        token: &SecretString,
        repo: &RepoRef,
        deployment: &Deployment,
    ) -> Result<u64, AwaitError> {
        let path = format!("/repos/{}/{}/deployments", repo.owner, repo.repo);
        let body = CreateDeploymentRequest {
            git_ref: deployment.commit_hash().unwrap_or_default().to_string(),
            auto_merge: false,
            environment: environment_name(deployment),
            production_environment: deployment.environment == Environment::Production,
            description: DEPLOYMENT_DESCRIPTION.to_string(),
            required_contexts: vec![],
        };

        let record = self.post(token, &path, &body).await?;
        record.id.ok_or_else(|| {
            AwaitError::GitHubError(format!(
                "Deployment was not created: {}",
                record.message.unwrap_or_default()
            ))
        })
    }

    async fn create_status(
        &self,
        token: &SecretString,
        repo: &RepoRef,
        record_id: u64,
        deployment: &Deployment,
        state: MirrorState,
    ) -> Result<(), AwaitError> {
        let path = format!(
            "/repos/{}/{}/deployments/{}/statuses",
            repo.owner, repo.repo, record_id
        );
        let body = CreateDeploymentStatusRequest {
            state,
            environment: environment_name(deployment),
            environment_url: deployment.url.clone(),
            log_url: deployment.dashboard_url(&self.account_id),
            description: DEPLOYMENT_DESCRIPTION.to_string(),
        };

        self.post(token, &path, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusMirror for GithubMirror {
    async fn update(&mut self, deployment: &Deployment, state: MirrorState) -> Result<(), AwaitError> {
        let Some(token) = self.token.as_ref() else {
            return Ok(());
        };
        let repo = self.repository.as_ref().ok_or_else(|| {
            AwaitError::GitHubError("GITHUB_REPOSITORY is not set, cannot mirror deployment".to_string())
        })?;

        let record_id = match self.record_id {
            Some(id) => id,
            None => {
                let id = self.create_deployment(token, repo, deployment).await?;
                info!("Created GitHub deployment {}", id);
                self.record_id = Some(id);
                id
            }
        };

        // Intermediate updates only make sure the record exists
        if deployment.is_deploy_finished() {
            self.create_status(token, repo, record_id, deployment, state).await?;
            info!("GitHub deployment {} marked as {}", record_id, state.as_str());
        }

        Ok(())
    }
}
