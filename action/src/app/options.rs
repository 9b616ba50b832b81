//! Run configuration resolved from action inputs

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::authn::auth_headers::AuthHeaders;
use crate::errors::AwaitError;
use crate::github::mirror::{RepoRef, GITHUB_API_URL};
use crate::http::client::CLOUDFLARE_API_URL;
use crate::logs::LogLevel;
use crate::notify::dingtalk::dingtalk_webhook_url;
use crate::utils::non_empty;
use crate::workers::poller;

/// Raw inputs, looked up by their action input name
///
/// Command line `--name=value` arguments win over `INPUT_<NAME>` variables.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    args: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl Inputs {
    pub fn new(args: HashMap<String, String>, env: HashMap<String, String>) -> Self {
        Self { args, env }
    }

    /// Inputs of the current process
    pub fn from_process(args: HashMap<String, String>) -> Self {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::new(args, env)
    }

    /// Environment variable name GitHub Actions uses for an input
    pub fn env_name(name: &str) -> String {
        format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
    }

    /// Trimmed input value; empty values count as missing
    pub fn get(&self, name: &str) -> Option<String> {
        non_empty(self.args.get(name).map(String::as_str))
            .or_else(|| non_empty(self.env.get(&Self::env_name(name)).map(String::as_str)))
    }

    /// Required input value
    pub fn require(&self, name: &str) -> Result<String, AwaitError> {
        self.get(name)
            .ok_or_else(|| AwaitError::ConfigError(format!("Input required and not supplied: {}", name)))
    }

    /// Runner environment variable (`GITHUB_*`)
    pub fn var(&self, name: &str) -> Option<String> {
        non_empty(self.env.get(name).map(String::as_str))
    }

    fn seconds(&self, name: &str) -> Result<Option<Duration>, AwaitError> {
        self.get(name)
            .map(|raw| {
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| AwaitError::ConfigError(format!("Invalid {} ({}): {}", name, raw, e)))
            })
            .transpose()
    }
}

/// Cloudflare options
#[derive(Debug)]
pub struct CloudflareOptions {
    pub api_url: String,
    pub account_id: String,
    pub project: String,
    pub auth: AuthHeaders,
}

/// GitHub deployment mirror options
#[derive(Debug)]
pub struct GithubOptions {
    pub api_url: String,
    pub token: Option<SecretString>,
    pub repository: Option<RepoRef>,
}

/// Chat notification options
#[derive(Debug, Clone)]
pub struct NotifierOptions {
    /// Full webhook URL (contains the key, never log it)
    pub webhook_url: Option<Url>,

    /// How long pending deliveries may delay exit
    pub flush_grace: Duration,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            webhook_url: None,
            flush_grace: Duration::from_secs(10),
        }
    }
}

/// Main run options
#[derive(Debug)]
pub struct AppOptions {
    pub cloudflare: CloudflareOptions,

    pub github: GithubOptions,

    pub notifier: NotifierOptions,

    /// Poller options
    pub poller: poller::Options,

    /// Only follow deployments of this commit
    pub commit_hash: Option<String>,

    /// Give up after this long; unbounded when `None`
    pub max_wait: Option<Duration>,
}

/// The `logLevel` input; `None` when not supplied
pub fn log_level(inputs: &Inputs) -> Result<Option<LogLevel>, AwaitError> {
    inputs
        .get("logLevel")
        .map(|raw| raw.parse::<LogLevel>().map_err(AwaitError::ConfigError))
        .transpose()
}

impl AppOptions {
    /// Validate inputs and build typed options
    ///
    /// Fails before any network call when credentials are incomplete.
    pub fn from_inputs(inputs: &Inputs) -> Result<Self, AwaitError> {
        let auth = AuthHeaders::from_inputs(
            inputs.get("apiToken"),
            inputs.get("accountEmail"),
            inputs.get("apiKey"),
        )?;

        let cloudflare = CloudflareOptions {
            api_url: inputs
                .get("cloudflareApiUrl")
                .unwrap_or_else(|| CLOUDFLARE_API_URL.to_string()),
            account_id: inputs.require("accountId")?,
            project: inputs.require("project")?,
            auth,
        };

        let github = GithubOptions {
            api_url: inputs
                .get("githubApiUrl")
                .or_else(|| inputs.var("GITHUB_API_URL"))
                .unwrap_or_else(|| GITHUB_API_URL.to_string()),
            token: inputs.get("githubToken").map(SecretString::from),
            repository: inputs
                .var("GITHUB_REPOSITORY")
                .map(|r| r.parse::<RepoRef>())
                .transpose()?,
        };

        let notifier = NotifierOptions {
            webhook_url: inputs
                .get("dingWebHookKey")
                .map(|key| dingtalk_webhook_url(&key))
                .transpose()?,
            ..Default::default()
        };

        let mut poller = poller::Options::default();
        if let Some(interval) = inputs.seconds("pollIntervalSecs")? {
            if interval.is_zero() {
                return Err(AwaitError::ConfigError(
                    "pollIntervalSecs must be greater than zero".to_string(),
                ));
            }
            poller.interval = interval;
        }

        Ok(Self {
            cloudflare,
            github,
            notifier,
            poller,
            commit_hash: inputs.get("commitHash"),
            max_wait: inputs.seconds("maxWaitSecs")?,
        })
    }
}
