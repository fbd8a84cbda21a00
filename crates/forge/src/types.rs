//! Shared value types for the forge adapter.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! behaviour: the pipeline status enumeration owns the status-to-annotation
//! mapping used for patch comments, and the session status decides whether a
//! login completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pipeline status
// ---------------------------------------------------------------------------

/// Status of a CI pipeline as reported by the CI server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Created but not yet queued.
    Created,
    /// Waiting for an agent.
    Pending,
    /// Executing.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with a failing step.
    Failure,
    /// Cancelled by a user.
    Killed,
    /// Could not be executed (configuration or infrastructure error).
    Error,
    /// Waiting for approval.
    Blocked,
    /// Approval was declined.
    Declined,
    /// Skipped by a filter.
    Skipped,
}

impl PipelineStatus {
    /// Returns the CI server's wire name for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Killed => "killed",
            Self::Error => "error",
            Self::Blocked => "blocked",
            Self::Declined => "declined",
            Self::Skipped => "skipped",
        }
    }

    /// Returns `true` while the pipeline is still queued or executing.
    ///
    /// In-progress pipelines never produce a patch comment.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Maps this status to the icon and phrasing used in patch comments.
    pub fn annotation(self) -> StatusAnnotation {
        match self {
            Self::Failure | Self::Killed | Self::Error | Self::Declined => StatusAnnotation {
                icon: "❌",
                phrasing: StatusPhrasing::Completed,
            },
            Self::Success => StatusAnnotation {
                icon: "✅",
                phrasing: StatusPhrasing::Completed,
            },
            Self::Skipped => StatusAnnotation {
                icon: "↪️",
                phrasing: StatusPhrasing::Current,
            },
            Self::Created | Self::Pending | Self::Running | Self::Blocked => StatusAnnotation {
                icon: "⏳",
                phrasing: StatusPhrasing::Current,
            },
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a patch comment reports a terminal or an intermediate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPhrasing {
    /// The pipeline reached a terminal state.
    Completed,
    /// The status may still change.
    Current,
}

impl StatusPhrasing {
    /// Returns the text embedded in the comment body.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed with",
            Self::Current => "current",
        }
    }
}

/// Icon and phrasing for one [`PipelineStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusAnnotation {
    /// Emoji shown next to the status name.
    pub icon: &'static str,
    /// Terminal or intermediate phrasing.
    pub phrasing: StatusPhrasing,
}

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// Authorization status of a node session, as reported by the session-info
/// endpoint.
///
/// Values the adapter does not know deserialize to [`SessionStatus::Unknown`]
/// and are treated as not authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The token was issued but the user has not yet authorized it.
    Unauthorized,
    /// The user authorized the token in the node's UI.
    Authorized,
    /// Authorization is in progress.
    Pending,
    /// Any value introduced by a newer node, or no value at all.
    #[default]
    #[serde(other)]
    Unknown,
}

impl SessionStatus {
    /// Returns `true` only for [`SessionStatus::Authorized`].
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Page selection passed by the CI server to list operations.
///
/// Pages are 1-based on the CI side; a page of `0` is treated like `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// 1-based page number.
    pub page: u32,
    /// Maximum number of items per page.
    pub per_page: u32,
}

impl ListOptions {
    /// Creates new list options.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from seconds since the Unix epoch.
    ///
    /// Returns `None` for values outside chrono's representable range.
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(Self)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
