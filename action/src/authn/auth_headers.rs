//! Cloudflare API credentials

use reqwest::{header, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

use crate::errors::AwaitError;

/// Credentials attached to every Cloudflare request
///
/// Chosen once at startup; an API token always takes precedence over a
/// global key.
#[derive(Debug)]
pub enum AuthHeaders {
    /// `Authorization: Bearer <token>`
    Token(SecretString),

    /// `X-Auth-Email` + `X-Auth-Key`
    GlobalKey { email: String, key: SecretString },
}

impl AuthHeaders {
    /// Pick the authentication scheme from the raw inputs
    pub fn from_inputs(
        api_token: Option<String>,
        account_email: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self, AwaitError> {
        if let Some(token) = api_token {
            return Ok(AuthHeaders::Token(SecretString::from(token)));
        }

        match (account_email, api_key) {
            (Some(email), Some(key)) => Ok(AuthHeaders::GlobalKey {
                email,
                key: SecretString::from(key),
            }),
            _ => Err(AwaitError::ConfigError(
                "Please specify authentication details! Set either `apiToken` or `accountEmail` + `apiKey`!"
                    .to_string(),
            )),
        }
    }

    /// Attach the credentials to a request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            AuthHeaders::Token(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            AuthHeaders::GlobalKey { email, key } => request
                .header("X-Auth-Email", email.as_str())
                .header("X-Auth-Key", key.expose_secret()),
        }
    }

    /// Short description safe for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AuthHeaders::Token(_) => "api token",
            AuthHeaders::GlobalKey { .. } => "global api key",
        }
    }
}
