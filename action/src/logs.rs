//! Logging setup for the action process
//!
//! Everything is written to stderr: stdout carries workflow commands
//! (`::set-output`, `::error::`) that the runner parses.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::AwaitError;

/// Log level accepted by the `logLevel` input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Directive applied to this crate; HTTP internals stay at `warn`
    pub fn directive(&self) -> String {
        format!("warn,pages_await={}", self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Logging options
#[derive(Debug, Clone)]
pub struct LogOptions {
    pub log_level: LogLevel,

    /// One JSON object per line instead of human readable text
    pub json_format: bool,

    pub ansi: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_format: false,
            ansi: true,
        }
    }
}

impl LogOptions {
    /// Options for a workflow step
    ///
    /// An explicit level wins; otherwise step debug logging
    /// (`RUNNER_DEBUG=1`) selects `debug`. `NO_COLOR` disables ANSI colors.
    pub fn for_runner(
        level: Option<LogLevel>,
        json_format: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let runner_debug = env("RUNNER_DEBUG").is_some_and(|v| v.trim() == "1");
        let log_level = match level {
            Some(level) => level,
            None if runner_debug => LogLevel::Debug,
            None => LogLevel::Info,
        };

        Self {
            log_level,
            json_format,
            ansi: env("NO_COLOR").is_none(),
        }
    }
}

/// Initialize logging
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging(options: LogOptions) -> Result<(), AwaitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.directive()));

    let subscriber = tracing_subscriber::registry().with(filter);

    if options.json_format {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| AwaitError::ConfigError(e.to_string()))?;
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(options.ansi)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| AwaitError::ConfigError(e.to_string()))?;
    }

    Ok(())
}
