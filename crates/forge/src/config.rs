//! Process-wide adapter configuration.
//!
//! [`ForgeConfig`] is built once at startup and shared read-only by every
//! component. It also owns the two URL contracts the adapter has with the
//! outside world: the login URL handed to users and the pipeline details URL
//! embedded in patch comments.

use thiserror::Error;
use url::Url;

use crate::{HookSecret, PipelineNumber};

/// Path on the CI server that the node's authorization UI redirects back to.
const AUTHORIZE_PATH: &str = "/authorize";

/// Path on the node that hosts the authorization UI.
const NODE_LOGIN_PATH: &str = "/login";

/// Query parameter the node's authorization UI reads the callback from.
const CALLBACK_QUERY_KEY: &str = "callback_url";

/// Configuration problems detected at startup. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required URL was empty.
    #[error("must provide a value for {setting}")]
    MissingValue {
        /// Name of the setting.
        setting: &'static str,
    },

    /// A URL could not be parsed.
    #[error("must provide a valid {setting} value: {message}")]
    InvalidUrl {
        /// Name of the setting.
        setting: &'static str,
        /// Parser message.
        message: String,
    },
}

/// Immutable adapter configuration.
///
/// Both URLs are stored without trailing slashes.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    node_url: String,
    ci_url: String,
    hook_secret: HookSecret,
}

impl ForgeConfig {
    /// Setting name reported for the node URL.
    pub const NODE_URL_SETTING: &'static str = "RADICLE_URL";
    /// Setting name reported for the CI server URL.
    pub const CI_URL_SETTING: &'static str = "WOODPECKER_HOST_URL";

    /// Validates and normalizes the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either URL is empty after trimming trailing
    /// slashes or is not an absolute URL.
    pub fn new(
        node_url: &str,
        ci_url: &str,
        hook_secret: HookSecret,
    ) -> Result<Self, ConfigError> {
        let node_url = normalize_url(node_url, Self::NODE_URL_SETTING)?;
        let ci_url = normalize_url(ci_url, Self::CI_URL_SETTING)?;

        if hook_secret.is_empty() {
            tracing::warn!("no webhook secret configured; delivery signatures will not be verified");
        }

        Ok(Self {
            node_url,
            ci_url,
            hook_secret,
        })
    }

    /// Base URL of the Radicle node.
    pub fn node_url(&self) -> &str {
        &self.node_url
    }

    /// Externally reachable base URL of the CI server.
    pub fn ci_url(&self) -> &str {
        &self.ci_url
    }

    /// Shared webhook secret (may be empty).
    pub fn hook_secret(&self) -> &HookSecret {
        &self.hook_secret
    }

    /// Builds the URL the user visits to obtain a session token.
    ///
    /// Deterministic in the two configured URLs:
    /// `{node_url}/login?callback_url={ci_url}/authorize` with the callback
    /// form-encoded.
    pub fn login_url(&self) -> String {
        let callback = format!("{}{AUTHORIZE_PATH}", self.ci_url);
        let encoded: String = url::form_urlencoded::byte_serialize(callback.as_bytes()).collect();
        format!(
            "{}{NODE_LOGIN_PATH}?{CALLBACK_QUERY_KEY}={encoded}",
            self.node_url
        )
    }

    /// Builds the CI server's details page URL for a pipeline.
    pub fn pipeline_status_url(&self, repo_id: u64, number: PipelineNumber) -> String {
        format!("{}/repos/{repo_id}/pipeline/{number}", self.ci_url)
    }
}

fn normalize_url(raw: &str, setting: &'static str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::MissingValue { setting });
    }
    Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        setting,
        message: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
