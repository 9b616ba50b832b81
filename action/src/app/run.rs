//! Run driver: wires options to the polling loop and publishes the outcome

use std::time::Duration;

use tracing::info;

use crate::actions::outputs::ActionOutputs;
use crate::app::options::AppOptions;
use crate::errors::AwaitError;
use crate::github::mirror::{GithubMirror, StatusMirror};
use crate::http::client::CloudflareClient;
use crate::http::deployments::DeploymentSource;
use crate::notify::dingtalk::DingTalkNotifier;
use crate::notify::messages::{CommitInfo, MessageContext};
use crate::notify::Notifier;
use crate::workers::poller::{self, RunContext, RunOutcome};

/// Where unexpected failures should be reported
pub const ISSUES_URL: &str = "https://github.com/WalshyDev/cf-pages-await/issues";

/// Follow the deployment until it ends
///
/// Pending notifications are flushed (bounded by the configured grace period)
/// before returning, whatever the result.
pub async fn run(options: AppOptions, commit: CommitInfo) -> Result<RunOutcome, AwaitError> {
    let AppOptions {
        cloudflare,
        github,
        notifier: notifier_options,
        poller: poller_options,
        commit_hash,
        max_wait,
        ..
    } = options;

    info!(
        "Following Pages project {} (auth: {})",
        cloudflare.project,
        cloudflare.auth.kind()
    );

    let source = CloudflareClient::new(
        &cloudflare.api_url,
        cloudflare.auth,
        &cloudflare.account_id,
        &cloudflare.project,
    )?;

    let mut mirror = GithubMirror::new(
        &github.api_url,
        github.token,
        github.repository,
        &cloudflare.account_id,
    )?;
    if !mirror.is_enabled() {
        info!("No githubToken provided, GitHub deployments will not be updated");
    }

    let notifier = DingTalkNotifier::new(notifier_options.webhook_url)?;

    let ctx = RunContext {
        commit_hash,
        messages: MessageContext {
            project: cloudflare.project,
            account_id: cloudflare.account_id,
            commit,
        },
    };

    let result = await_outcome(
        &poller_options,
        &ctx,
        &source,
        &mut mirror,
        &notifier,
        max_wait,
    )
    .await;

    notifier.flush(notifier_options.flush_grace).await;
    result
}

/// Run the poller, bounded by `max_wait` when set
pub async fn await_outcome(
    options: &poller::Options,
    ctx: &RunContext,
    source: &dyn DeploymentSource,
    mirror: &mut dyn StatusMirror,
    notifier: &dyn Notifier,
    max_wait: Option<Duration>,
) -> Result<RunOutcome, AwaitError> {
    let polling = poller::run(options, ctx, source, mirror, notifier, tokio::time::sleep);

    match max_wait {
        Some(max_wait) => tokio::time::timeout(max_wait, polling)
            .await
            .map_err(|_| AwaitError::Timeout(max_wait))?,
        None => polling.await,
    }
}

/// Publish step outputs and mark the step failed when the pipeline failed
pub async fn publish_outcome(
    outcome: &RunOutcome,
    outputs: &mut ActionOutputs,
) -> Result<(), AwaitError> {
    for (name, value) in outcome.outputs() {
        outputs.set_output(name, &value).await?;
    }

    if let Some(message) = outcome.failure() {
        outputs.set_failed(&message);
    }

    Ok(())
}
