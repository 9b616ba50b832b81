//! State machine deriving lifecycle transitions from deployment snapshots

use crate::models::deployment::{Deployment, StageStatus};

/// Phase of a polling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    /// No snapshot seen yet
    WaitingForDeployment,

    /// A deployment is being followed
    Tracking,

    /// Cloudflare skipped the build
    Skipped,

    /// A stage failed
    Failed,

    /// The deploy stage finished
    Succeeded,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Skipped | RunPhase::Failed | RunPhase::Succeeded)
    }
}

/// What the loop has to do after a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Poll again
    Continue,

    /// Stop without side effects
    Skipped,

    /// Stop, notify failure and mark the run failed
    Failed,

    /// Stop after the deploy stage finished
    Finished { success: bool },
}

/// Result of observing one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The stage name differs from the previous snapshot
    pub stage_changed: bool,

    /// The GitHub mirror must record `in_progress` (first transition only)
    pub mark_in_progress: bool,

    pub verdict: Verdict,
}

impl Decision {
    fn idle() -> Self {
        Self {
            stage_changed: false,
            mark_in_progress: false,
            verdict: Verdict::Continue,
        }
    }
}

/// Reconciler state owned by the polling loop
///
/// Lives for one run only; nothing is persisted.
#[derive(Debug, Clone)]
pub struct ReconcilerState {
    phase: RunPhase,
    last_stage: Option<String>,
    marked_in_progress: bool,
    pinned_id: Option<String>,
}

impl ReconcilerState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::WaitingForDeployment,
            last_stage: None,
            marked_in_progress: false,
            pinned_id: None,
        }
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    /// Name of the last stage seen
    pub fn last_stage(&self) -> Option<&str> {
        self.last_stage.as_deref()
    }

    /// Id of the deployment followed by this run, once resolved
    pub fn pinned_id(&self) -> Option<&str> {
        self.pinned_id.as_deref()
    }

    /// Whether the loop should keep polling
    pub fn is_waiting(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Fold one snapshot into the state
    ///
    /// `None` means the deployment is not visible (yet); the phase is left
    /// unchanged. Once a terminal verdict is returned the state is final and
    /// further snapshots are ignored.
    pub fn observe(&mut self, snapshot: Option<&Deployment>) -> Decision {
        if self.phase.is_terminal() {
            return Decision::idle();
        }
        let Some(deployment) = snapshot else {
            return Decision::idle();
        };

        if self.pinned_id.is_none() {
            self.pinned_id = Some(deployment.id.clone());
        }

        if deployment.is_skipped() {
            self.phase = RunPhase::Skipped;
            return Decision {
                verdict: Verdict::Skipped,
                ..Decision::idle()
            };
        }

        let stage = &deployment.latest_stage;
        let stage_changed = self.last_stage.as_deref() != Some(stage.name.as_str());
        let mut mark_in_progress = false;
        if stage_changed {
            self.last_stage = Some(stage.name.clone());
            if !self.marked_in_progress {
                self.marked_in_progress = true;
                mark_in_progress = true;
            }
        }

        let verdict = if stage.status == StageStatus::Failed {
            self.phase = RunPhase::Failed;
            Verdict::Failed
        } else if deployment.is_deploy_finished() {
            self.phase = RunPhase::Succeeded;
            Verdict::Finished {
                success: stage.status == StageStatus::Success,
            }
        } else {
            self.phase = RunPhase::Tracking;
            Verdict::Continue
        };

        Decision {
            stage_changed,
            mark_in_progress,
            verdict,
        }
    }
}

impl Default for ReconcilerState {
    fn default() -> Self {
        Self::new()
    }
}
