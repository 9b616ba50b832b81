//! Polling loop following one Pages deployment to its end

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::deploy::reconciler::{ReconcilerState, Verdict};
use crate::errors::AwaitError;
use crate::github::mirror::StatusMirror;
use crate::http::deployments::DeploymentSource;
use crate::models::deployment::{Deployment, StageStatus};
use crate::models::github::MirrorState;
use crate::notify::messages::{failure_message, success_message, MessageContext};
use crate::notify::Notifier;

/// Poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay before every poll
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Per-run inputs of the loop
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Only follow deployments built from this commit
    pub commit_hash: Option<String>,

    /// Template data for notifications
    pub messages: MessageContext,
}

/// Terminal outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Cloudflare skipped the build
    Skipped { deployment_id: String },

    /// A stage failed
    Failed { deployment: Deployment },

    /// The deploy stage finished
    Finished { deployment: Deployment, success: bool },
}

impl RunOutcome {
    /// Step outputs published for the workflow
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        match self {
            RunOutcome::Skipped { deployment_id } => {
                vec![("status", format!("Deployment skipped {}!", deployment_id))]
            }
            RunOutcome::Failed { .. } => vec![],
            RunOutcome::Finished { deployment, success } => vec![
                ("id", deployment.id.clone()),
                ("environment", deployment.environment.to_string()),
                ("url", deployment.url.clone()),
                ("alias", deployment.alias_url().to_string()),
                ("success", success.to_string()),
            ],
        }
    }

    /// Message the run is marked failed with, if it failed
    pub fn failure(&self) -> Option<String> {
        match self {
            RunOutcome::Failed { deployment } => Some(format!(
                "Deployment step failed: {}!",
                deployment.latest_stage.name
            )),
            _ => None,
        }
    }
}

async fn mirror_update(mirror: &mut dyn StatusMirror, deployment: &Deployment, state: MirrorState) {
    if let Err(e) = mirror.update(deployment, state).await {
        error!("Failed to update GitHub deployment ({}): {}", state.as_str(), e);
    }
}

/// Run the polling loop until a terminal outcome or a fatal error
pub async fn run<S, F>(
    options: &Options,
    ctx: &RunContext,
    source: &dyn DeploymentSource,
    mirror: &mut dyn StatusMirror,
    notifier: &dyn Notifier,
    sleep_fn: S,
) -> Result<RunOutcome, AwaitError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Waiting for Cloudflare Pages to finish building...");
    let mut state = ReconcilerState::new();

    while state.is_waiting() {
        sleep_fn(options.interval).await;

        let snapshot = source
            .poll_deployment(ctx.commit_hash.as_deref(), state.pinned_id())
            .await?;

        let Some(deployment) = snapshot else {
            match state.pinned_id() {
                Some(id) => warn!(
                    "Deployment {} is no longer listed (last stage: {}), still waiting...",
                    id,
                    state.last_stage().unwrap_or("unknown")
                ),
                None => info!("Waiting for the deployment to start..."),
            }
            state.observe(None);
            continue;
        };

        let newly_pinned = state.pinned_id().is_none();
        let decision = state.observe(Some(&deployment));
        if newly_pinned {
            info!(
                "Following deployment {} (trigger: {}, commit: {})",
                deployment.id,
                deployment.trigger_type().unwrap_or("unknown"),
                deployment.commit_hash().unwrap_or("unknown")
            );
        }
        debug!(
            "Deployment {} is {:?}, decision: {:?}",
            deployment.id,
            state.phase(),
            decision
        );

        if decision.verdict == Verdict::Skipped {
            info!("Deployment skipped {}!", deployment.id);
            return Ok(RunOutcome::Skipped {
                deployment_id: deployment.id,
            });
        }

        if decision.stage_changed {
            info!("# Current stage: {}", deployment.latest_stage.name);
        }
        if decision.mark_in_progress {
            mirror_update(mirror, &deployment, MirrorState::InProgress).await;
        }

        match decision.verdict {
            Verdict::Continue | Verdict::Skipped => {}
            Verdict::Failed => {
                error!(
                    "Stage {} of deployment {} failed",
                    deployment.latest_stage.name, deployment.id
                );
                if notifier.is_enabled() {
                    let logs = source.log_tail(&deployment.id).await;
                    notifier.notify(failure_message(&ctx.messages, &deployment, &logs));
                }
                mirror_update(mirror, &deployment, MirrorState::Failure).await;
                return Ok(RunOutcome::Failed { deployment });
            }
            Verdict::Finished { success } => {
                info!(
                    "Deployment {} finished: {}",
                    deployment.id,
                    deployment.latest_stage.status.as_str()
                );
                if success {
                    notifier.notify(success_message(&ctx.messages, &deployment));
                }
                let final_state = if deployment.latest_stage.status == StageStatus::Success {
                    MirrorState::Success
                } else {
                    MirrorState::Failure
                };
                mirror_update(mirror, &deployment, final_state).await;
                return Ok(RunOutcome::Finished { deployment, success });
            }
        }
    }

    Err(AwaitError::Internal(
        "polling stopped without a terminal outcome".to_string(),
    ))
}
