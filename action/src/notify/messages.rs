//! Notification templates

use crate::models::deployment::Deployment;

/// Commit details shown in notifications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitInfo {
    pub url: String,
    pub message: String,
    pub author: String,
    pub date: String,
    pub actor: String,
}

/// Everything a template needs besides the snapshot
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub project: String,
    pub account_id: String,
    pub commit: CommitInfo,
}

impl MessageContext {
    /// The local checkout wins; the trigger's commit subject fills in when git had nothing
    fn commit_lines(&self, deployment: &Deployment) -> String {
        let message = match self.commit.message.as_str() {
            "" => deployment.commit_message().unwrap_or_default(),
            local => local,
        };
        let mut lines = format!(
            "Commit: {}\nCommit message: {}\nAuthor: {} ({})",
            self.commit.url, message, self.commit.author, self.commit.date
        );
        if !self.commit.actor.is_empty() {
            lines.push_str(&format!("\nTriggered by: {}", self.commit.actor));
        }
        lines
    }
}

/// Text sent when a stage fails
pub fn failure_message(ctx: &MessageContext, deployment: &Deployment, logs: &str) -> String {
    format!(
        "❌ CloudFlare Pages {stage} pipeline for project {project} failed!\n\
         Environment: {environment}\n\
         {commit}\n\
         Deployment ID: {id}\n\
         Build log: {dashboard}\n\
         Deployment logs: {logs}",
        stage = deployment.latest_stage.name,
        project = ctx.project,
        environment = deployment.environment,
        commit = ctx.commit_lines(deployment),
        id = deployment.id,
        dashboard = deployment.dashboard_url(&ctx.account_id),
        logs = logs,
    )
}

/// Text sent when the deploy stage succeeds
pub fn success_message(ctx: &MessageContext, deployment: &Deployment) -> String {
    format!(
        "✅ CloudFlare Pages deployment pipeline for project {project} succeeded!\n\
         Environment: {environment}\n\
         {commit}\n\
         Deployment ID: {id}\n\
         Alias URL: {alias}\n\
         Deployment URL: {url}\n\
         Build log: {dashboard}",
        project = ctx.project,
        environment = deployment.environment,
        commit = ctx.commit_lines(deployment),
        id = deployment.id,
        alias = deployment.alias_url(),
        url = deployment.url,
        dashboard = deployment.dashboard_url(&ctx.account_id),
    )
}
