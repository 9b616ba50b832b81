//! Error types for pages-await

use std::time::Duration;

use thiserror::Error;

/// Main error type for a polling run
#[derive(Error, Debug)]
pub enum AwaitError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The Cloudflare API answered with `success: false`
    #[error("Cloudflare API error: {0}")]
    ApiError(String),

    /// The Cloudflare API answered with something that is not the expected JSON
    #[error("Invalid response ({status}): {message}")]
    InvalidResponse { status: u16, message: String },

    #[error("GitHub error: {0}")]
    GitHubError(String),

    #[error("Notification error: {0}")]
    NotifyError(String),

    #[error("Timed out after {0:?} waiting for the deployment to finish")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for AwaitError {
    fn from(err: tokio::task::JoinError) -> Self {
        AwaitError::Internal(err.to_string())
    }
}
