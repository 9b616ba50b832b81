//! Commit metadata read from the local checkout

use chrono::{DateTime, FixedOffset};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::actions::context::RunnerContext;
use crate::errors::AwaitError;
use crate::notify::messages::CommitInfo;

/// Offset commit dates are shown in
const DISPLAY_OFFSET_SECS: i32 = 8 * 3600;

/// Run `git log -1` with a pretty format
async fn git_log(format: &str) -> Result<String, AwaitError> {
    let output = Command::new("git")
        .args(["log", "-1", &format!("--pretty=format:{}", format)])
        .output()
        .await?;

    if !output.status.success() {
        return Err(AwaitError::Internal(format!(
            "git log failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn git_log_or_empty(format: &str) -> String {
    git_log(format).await.unwrap_or_else(|e| {
        warn!("Unable to read commit metadata ({}): {}", format, e);
        String::new()
    })
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM UTC+8`
pub fn format_commit_date(timestamp: i64) -> Option<String> {
    let offset = FixedOffset::east_opt(DISPLAY_OFFSET_SECS)?;
    let date = DateTime::from_timestamp(timestamp, 0)?.with_timezone(&offset);
    Some(format!("{} UTC+8", date.format("%Y-%m-%d %H:%M")))
}

/// Collect commit details for notifications
///
/// Best-effort: anything git cannot tell us stays empty.
pub async fn collect_commit_info(runner: &RunnerContext) -> CommitInfo {
    let message = git_log_or_empty("%s").await;
    let author = git_log_or_empty("%an").await;
    let date = git_log_or_empty("%ct")
        .await
        .parse::<i64>()
        .ok()
        .and_then(format_commit_date)
        .unwrap_or_default();

    debug!("Commit metadata: {:?} by {:?} at {:?}", message, author, date);

    CommitInfo {
        url: runner.commit_url.clone(),
        message,
        author,
        date,
        actor: runner.actor.clone(),
    }
}
