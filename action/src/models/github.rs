//! GitHub deployment API models

use serde::{Deserialize, Serialize};

/// Deployment state accepted by the GitHub deployment status API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorState {
    InProgress,
    Success,
    Failure,
}

impl MirrorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MirrorState::InProgress => "in_progress",
            MirrorState::Success => "success",
            MirrorState::Failure => "failure",
        }
    }
}

/// Body of `POST /repos/{owner}/{repo}/deployments`
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeploymentRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub auto_merge: bool,
    pub environment: String,
    pub production_environment: bool,
    pub description: String,
    pub required_contexts: Vec<String>,
}

/// Body of `POST /repos/{owner}/{repo}/deployments/{id}/statuses`
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeploymentStatusRequest {
    pub state: MirrorState,
    pub environment: String,
    pub environment_url: String,
    pub log_url: String,
    pub description: String,
}

/// The fields of a created GitHub deployment that are used afterwards
///
/// A `202 Accepted` answer carries only a `message`, hence the optional id.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubDeploymentRecord {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub message: Option<String>,
}
