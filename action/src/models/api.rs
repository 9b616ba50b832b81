//! Cloudflare v4 API envelope and log history models

use serde::Deserialize;

/// Standard Cloudflare v4 response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,

    /// Error objects are passed through untouched so they can be surfaced as-is
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,

    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Human readable form of the first reported error
    pub fn first_error(&self) -> String {
        self.errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Result of the deployment log history endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogHistory {
    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub data: Vec<LogEntry>,
}

/// A single build log line
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub ts: Option<String>,

    #[serde(default)]
    pub line: String,
}
