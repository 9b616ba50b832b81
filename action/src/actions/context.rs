//! Workflow run context provided by the runner

use tracing::warn;

use crate::app::options::Inputs;
use crate::filesys::file::File;

/// Details about the workflow run used in notifications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerContext {
    /// User that triggered the workflow (`GITHUB_ACTOR`)
    pub actor: String,

    /// URL of the pushed head commit, from the event payload
    pub commit_url: String,
}

impl RunnerContext {
    /// Read the context; missing pieces are left empty
    pub async fn load(inputs: &Inputs) -> Self {
        let commit_url = match inputs.var("GITHUB_EVENT_PATH") {
            Some(path) => head_commit_url(&File::new(path)).await,
            None => String::new(),
        };

        Self {
            actor: inputs.var("GITHUB_ACTOR").unwrap_or_default(),
            commit_url,
        }
    }
}

/// `head_commit.url` of a webhook event payload
pub async fn head_commit_url(event_file: &File) -> String {
    match event_file.read_json::<serde_json::Value>().await {
        Ok(event) => event
            .pointer("/head_commit/url")
            .and_then(|url| url.as_str())
            .unwrap_or_default()
            .to_string(),
        Err(e) => {
            warn!("Unable to read event payload {}: {}", event_file.path().display(), e);
            String::new()
        }
    }
}
