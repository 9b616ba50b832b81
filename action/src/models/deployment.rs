//! Cloudflare Pages deployment models

use serde::{Deserialize, Serialize};

/// Name of the stage that ends every Pages pipeline
pub const DEPLOY_STAGE: &str = "deploy";

/// A deployment snapshot as returned by the Pages API
///
/// Snapshots are never mutated locally; each poll replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique deployment ID
    pub id: String,

    #[serde(default)]
    pub project_id: Option<String>,

    pub project_name: String,

    pub environment: Environment,

    #[serde(default)]
    pub deployment_trigger: Option<DeploymentTrigger>,

    /// Primary deployment URL
    pub url: String,

    /// Alias URLs (branch aliases, custom domains); the API sends `null` for none
    #[serde(default)]
    pub aliases: Option<Vec<String>>,

    pub latest_stage: Stage,

    #[serde(default)]
    pub is_skipped: Option<bool>,
}

impl Deployment {
    /// Commit hash recorded by the trigger, if any
    pub fn commit_hash(&self) -> Option<&str> {
        self.deployment_trigger
            .as_ref()
            .and_then(|t| t.metadata.as_ref())
            .and_then(|m| m.commit_hash.as_deref())
    }

    /// Branch recorded by the trigger, if any
    pub fn branch(&self) -> Option<&str> {
        self.deployment_trigger
            .as_ref()
            .and_then(|t| t.metadata.as_ref())
            .and_then(|m| m.branch.as_deref())
    }

    /// Commit subject recorded by the trigger, if any
    pub fn commit_message(&self) -> Option<&str> {
        self.deployment_trigger
            .as_ref()
            .and_then(|t| t.metadata.as_ref())
            .and_then(|m| m.commit_message.as_deref())
    }

    /// What started the deployment (`github:push`, `ad_hoc`, ...)
    pub fn trigger_type(&self) -> Option<&str> {
        self.deployment_trigger
            .as_ref()
            .and_then(|t| t.trigger_type.as_deref())
    }

    pub fn is_skipped(&self) -> bool {
        self.is_skipped == Some(true)
    }

    /// First alias, falling back to the primary URL
    pub fn alias_url(&self) -> &str {
        self.aliases
            .as_ref()
            .and_then(|aliases| aliases.first())
            .map(String::as_str)
            .unwrap_or(&self.url)
    }

    /// Link to the build page in the Cloudflare dashboard
    pub fn dashboard_url(&self, account_id: &str) -> String {
        format!(
            "https://dash.cloudflare.com?to=/{}/pages/view/{}/{}",
            account_id, self.project_name, self.id
        )
    }

    /// Whether the pipeline has reached a finished `deploy` stage
    pub fn is_deploy_finished(&self) -> bool {
        self.latest_stage.name == DEPLOY_STAGE
            && matches!(
                self.latest_stage.status,
                StageStatus::Success | StageStatus::Failed
            )
    }
}

/// What started the deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTrigger {
    #[serde(rename = "type", default)]
    pub trigger_type: Option<String>,

    #[serde(default)]
    pub metadata: Option<TriggerMetadata>,
}

/// Source control metadata of the trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMetadata {
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub commit_hash: Option<String>,

    #[serde(default)]
    pub commit_message: Option<String>,
}

/// A pipeline stage (`queued`, `initialize`, `clone_repository`, `build`, `deploy`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub status: StageStatus,
}

/// Status of a stage; unknown values are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StageStatus {
    Idle,
    Active,
    Success,
    Failed,
    Other(String),
}

impl From<String> for StageStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "idle" => StageStatus::Idle,
            "active" => StageStatus::Active,
            "success" => StageStatus::Success,
            "failed" => StageStatus::Failed,
            _ => StageStatus::Other(value),
        }
    }
}

impl From<StageStatus> for String {
    fn from(value: StageStatus) -> Self {
        value.as_str().to_string()
    }
}

impl StageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StageStatus::Idle => "idle",
            StageStatus::Active => "active",
            StageStatus::Success => "success",
            StageStatus::Failed => "failed",
            StageStatus::Other(other) => other,
        }
    }
}

/// Pages environment of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Production,
    Preview,
    Other(String),
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        match value.as_str() {
            "production" => Environment::Production,
            "preview" => Environment::Preview,
            _ => Environment::Other(value),
        }
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

impl Environment {
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Production => "production",
            Environment::Preview => "preview",
            Environment::Other(other) => other,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
