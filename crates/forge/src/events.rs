//! Webhook deliveries and the canonical events parsed from them.
//!
//! A [`HookDelivery`] is the raw inbound request. Once its signature has been
//! checked, the dispatcher turns it into a [`DispatchOutcome`]: either a
//! [`CanonicalEvent`] or an explicit "ignored" marker for event kinds the
//! adapter does not act on. Ignored events are not errors; callers log and
//! skip them, while a [`HookError`] is surfaced to the sender.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{PipelineTrigger, Repo};
use crate::{BranchName, CommitSha, DeliveryId, NodeId, PatchId, RepositoryId, RevisionId};

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// One inbound webhook request, exactly as received.
#[derive(Debug, Clone)]
pub struct HookDelivery {
    /// Correlation id assigned on receipt.
    pub id: DeliveryId,
    /// Declared event-type label, if the header was present.
    pub event_type: Option<String>,
    /// Declared signature, if the header was present.
    pub signature: Option<String>,
    /// Raw, unparsed body bytes.
    pub body: Vec<u8>,
}

impl HookDelivery {
    /// Creates a delivery with a fresh [`DeliveryId`].
    pub fn new(event_type: Option<String>, signature: Option<String>, body: Vec<u8>) -> Self {
        Self {
            id: DeliveryId::new_random(),
            event_type,
            signature,
            body,
        }
    }

    /// Classifies the declared event-type label.
    pub fn kind(&self) -> EventKind {
        EventKind::from_label(self.event_type.as_deref().unwrap_or_default())
    }
}

/// The event kinds a node can declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Commits were pushed to a branch.
    Push,
    /// A patch was opened or received a new revision.
    Patch,
    /// Anything else, including a missing label.
    Unknown(String),
}

impl EventKind {
    /// Label the node sends for pushes.
    pub const PUSH_LABEL: &'static str = "push";
    /// Label the node sends for patches.
    pub const PATCH_LABEL: &'static str = "patch";

    /// Classifies an event-type label. Matching is exact.
    pub fn from_label(label: &str) -> Self {
        match label {
            Self::PUSH_LABEL => Self::Push,
            Self::PATCH_LABEL => Self::Patch,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the label this kind was classified from.
    pub fn label(&self) -> &str {
        match self {
            Self::Push => Self::PUSH_LABEL,
            Self::Patch => Self::PATCH_LABEL,
            Self::Unknown(label) => label,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Canonical events
// ---------------------------------------------------------------------------

/// The repository section shared by all event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRepository {
    /// Repository RID.
    pub id: RepositoryId,
    /// Repository name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Default branch.
    pub default_branch: BranchName,
    /// Whether the repository is private.
    pub private: bool,
    /// Web URL.
    pub url: String,
    /// Git clone URL.
    pub clone_url: String,
    /// Repository delegates.
    pub delegates: Vec<NodeId>,
}

/// Commits were pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Repository pushed to.
    pub repository: HookRepository,
    /// Branch that moved.
    pub branch: BranchName,
    /// New head of the branch.
    pub head_commit: CommitSha,
    /// Message of the head commit, if the payload listed it.
    pub message: String,
    /// Web URL of the head commit, if the payload listed it.
    pub commit_url: String,
    /// Alias or id of the pusher.
    pub pusher: String,
}

/// A patch was opened or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEvent {
    /// Repository the patch belongs to.
    pub repository: HookRepository,
    /// The patch.
    pub patch_id: PatchId,
    /// The latest revision of the patch.
    pub revision_id: RevisionId,
    /// Head commit of the latest revision.
    pub head_commit: CommitSha,
    /// Branch the patch targets.
    pub branch: BranchName,
    /// What happened to the patch (e.g. `"created"`, `"updated"`).
    pub action: String,
    /// Patch title.
    pub title: String,
    /// Alias or id of the patch author.
    pub author: String,
    /// Web URL of the patch.
    pub url: String,
}

/// A parsed delivery the CI pipeline engine can act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalEvent {
    /// See [`PushEvent`].
    Push(PushEvent),
    /// See [`PatchEvent`].
    Patch(PatchEvent),
}

impl CanonicalEvent {
    /// The repository the event happened in.
    pub fn repository(&self) -> &HookRepository {
        match self {
            Self::Push(e) => &e.repository,
            Self::Patch(e) => &e.repository,
        }
    }

    /// The commit the event points at.
    pub fn head_commit(&self) -> &CommitSha {
        match self {
            Self::Push(e) => &e.head_commit,
            Self::Patch(e) => &e.head_commit,
        }
    }
}

/// Result of dispatching an authenticated delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The delivery was parsed into an event.
    Event(CanonicalEvent),
    /// The event kind is one the adapter intentionally does not act on.
    Ignored {
        /// The declared label.
        event: String,
    },
}

/// Result of [`crate::Forge::hook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// A pipeline should be created.
    Pipeline {
        /// Repository to build.
        repo: Box<Repo>,
        /// What to build.
        trigger: Box<PipelineTrigger>,
    },
    /// Nothing to do.
    Ignored {
        /// The declared label.
        event: String,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A delivery that must be rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    /// A secret is configured but the delivery carried no signature.
    #[error("missing hook message signature")]
    MissingSignature,

    /// The signature did not match the body.
    #[error("invalid hook message signature")]
    InvalidSignature,

    /// The body did not match the schema of its declared event kind.
    #[error("could not parse {event} hook payload: {message}")]
    Parse {
        /// The declared label.
        event: String,
        /// Parser message.
        message: String,
    },
}

impl HookError {
    /// Returns `true` for authentication failures.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::MissingSignature | Self::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_label() {
        assert_eq!(EventKind::from_label("push"), EventKind::Push);
        assert_eq!(EventKind::from_label("patch"), EventKind::Patch);
        assert_eq!(
            EventKind::from_label("Push"),
            EventKind::Unknown("Push".to_string())
        );
        assert_eq!(EventKind::from_label(""), EventKind::Unknown(String::new()));
    }

    #[test]
    fn test_missing_label_is_unknown() {
        let delivery = HookDelivery::new(None, None, b"{}".to_vec());
        assert_eq!(delivery.kind(), EventKind::Unknown(String::new()));
    }

    #[test]
    fn test_authentication_errors_are_classified() {
        assert!(HookError::MissingSignature.is_authentication());
        assert!(HookError::InvalidSignature.is_authentication());
        assert!(!HookError::Parse {
            event: "push".into(),
            message: "eof".into()
        }
        .is_authentication());
    }
}
