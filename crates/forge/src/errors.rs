//! Top-level error and retry-policy types for the forge adapter.
//!
//! [`ForgeError`] is the error type of every [`crate::Forge`] operation.
//! Component-level errors ([`crate::node::NodeApiError`] for remote calls,
//! [`crate::events::HookError`] for deliveries, [`crate::config::ConfigError`]
//! at startup) are defined in their respective modules and wrapped here.
//!
//! Nothing in the adapter retries. [`RetryPolicy`] is advice to the host
//! runtime, which owns any retry decision.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::HookError;
use crate::node::NodeApiError;
use crate::BranchName;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable`: transport failures, timeouts, 5xx responses from the node.
/// - `NonRetryable`: authentication failures, malformed payloads, missing
///   repositories, invalid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means the caller
        /// applies its own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried without a change of input.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Forge-level errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::Forge`] operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// A webhook delivery failed authentication or could not be parsed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The session token was checked and is not authorized.
    #[error("provided secret token is unauthorized")]
    Unauthorized,

    /// A remote call failed.
    #[error(transparent)]
    Node(#[from] NodeApiError),

    /// The repository to activate could not be fetched from the node.
    #[error("could not get repository, {0}")]
    RepositoryLookup(#[source] NodeApiError),

    /// Creating or replacing the repository's webhook failed.
    #[error("could not activate repository, {0}")]
    Activation(#[source] NodeApiError),

    /// Removing the repository's webhook failed.
    #[error("could not deactivate repository, {0}")]
    Deactivation(#[source] NodeApiError),

    /// Only the default branch is announced by the node.
    #[error("branch does not exist: {branch}")]
    BranchNotFound {
        /// The requested branch.
        branch: BranchName,
    },

    /// The default branch has no commits.
    #[error("branch has no commits")]
    EmptyBranch,

    /// File content returned by the node could not be decoded.
    #[error("could not decode content of '{path}': {message}")]
    Content {
        /// Path of the file within the repository.
        path: String,
        /// Decoder message.
        message: String,
    },
}

impl ForgeError {
    /// Returns whether the host may retry the failed operation.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Node(e)
            | Self::RepositoryLookup(e)
            | Self::Activation(e)
            | Self::Deactivation(e) => e.retry_policy(),
            Self::Hook(_)
            | Self::Unauthorized
            | Self::BranchNotFound { .. }
            | Self::EmptyBranch
            | Self::Content { .. } => RetryPolicy::NonRetryable,
        }
    }
}

/// A failed login.
///
/// Carries the login URL so the user-facing redirect flow is never a dead end.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct LoginError {
    /// URL the user can follow to obtain a session token.
    pub login_url: String,
    /// Why the login failed.
    #[source]
    pub source: ForgeError,
}

impl LoginError {
    /// Creates a new [`LoginError`].
    pub fn new(login_url: impl Into<String>, source: impl Into<ForgeError>) -> Self {
        Self {
            login_url: login_url.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
