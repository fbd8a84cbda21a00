//! Port to the Radicle node's HTTP API.
//!
//! [`NodeApi`] lists exactly the remote calls the adapter issues. The `radicle`
//! crate implements it over HTTP; tests implement it in memory. The response
//! types mirror the node's JSON (camelCase) and are converted to the CI-side
//! model by the orchestration layer.
//!
//! Every call is a single request/response. Cancellation is by dropping the
//! future; implementations must not retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::RetryPolicy;
use crate::{
    BranchName, CommitSha, HookSecret, NodeId, PatchId, RepositoryId, RevisionId, SessionStatus,
    SessionToken, Timestamp,
};

/// Content type the adapter registers webhooks with.
pub const WEBHOOK_CONTENT_TYPE: &str = "application/json";

/// Comment type for a comment on a patch revision.
pub const PATCH_COMMENT_TYPE: &str = "revision.comment";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed remote call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeApiError {
    /// The request could not be sent or the connection failed.
    #[error("request to {endpoint} failed: {message}")]
    Transport {
        /// API path that was called.
        endpoint: String,
        /// Transport message.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request to {endpoint} timed out")]
    Timeout {
        /// API path that was called.
        endpoint: String,
    },

    /// The node answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// API path that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The requested object does not exist on the node.
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing object.
        resource: String,
    },

    /// The response body did not match the expected shape.
    #[error("could not decode response from {endpoint}: {message}")]
    Decode {
        /// API path that was called.
        endpoint: String,
        /// Decoder message.
        message: String,
    },
}

impl NodeApiError {
    /// Returns whether the host may retry the failed call.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => RetryPolicy::Retryable { after: None },
            Self::Status { status, .. } if *status >= 500 || *status == 429 => {
                RetryPolicy::Retryable { after: None }
            }
            Self::Status { .. } | Self::NotFound { .. } | Self::Decode { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }

    /// Returns `true` if the node reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Node and session
// ---------------------------------------------------------------------------

/// Node configuration section of [`NodeInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Public identity of the node.
    pub id: NodeId,
    /// Node alias.
    #[serde(default)]
    pub alias: Option<String>,
}

/// `GET /api/v1/node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// Node configuration.
    pub config: NodeConfig,
    /// Software version.
    #[serde(default)]
    pub version: Option<String>,
    /// Running state (e.g. `"running"`).
    #[serde(default)]
    pub state: Option<String>,
}

/// `GET /api/v1/sessions/{token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session id (equal to the token).
    #[serde(default)]
    pub session_id: String,
    /// Authorization status; missing values are treated as unknown.
    #[serde(default)]
    pub status: SessionStatus,
    /// Key of the user who authorized the session.
    #[serde(default)]
    pub public_key: Option<NodeId>,
    /// Display alias of that user.
    #[serde(default)]
    pub alias: String,
    /// Issue time, Unix seconds.
    #[serde(default)]
    pub issued_at: Option<i64>,
    /// Expiry time, Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl SessionInfo {
    /// Returns the expiry time, if the node reported one.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at.and_then(Timestamp::from_unix_seconds)
    }

    /// Returns `true` if the session has an expiry time that lies before `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|expiry| expiry <= now)
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// A repository delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegate {
    /// Delegate identity.
    pub id: NodeId,
    /// Delegate alias.
    #[serde(default)]
    pub alias: Option<String>,
}

/// Repository visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// `"public"` or `"private"`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// `GET /api/v1/projects/{rid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Repository RID.
    pub id: RepositoryId,
    /// Repository name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Default branch.
    pub default_branch: BranchName,
    /// Head of the default branch.
    #[serde(default)]
    pub head: Option<CommitSha>,
    /// Repository delegates.
    #[serde(default)]
    pub delegates: Vec<Delegate>,
    /// Visibility; public when absent.
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl Project {
    /// Returns `true` if the node reports the repository as private.
    pub fn is_private(&self) -> bool {
        self.visibility
            .as_ref()
            .is_some_and(|v| v.kind == "private")
    }

    /// Returns `true` if `node` is one of the repository delegates.
    pub fn is_delegate(&self, node: &NodeId) -> bool {
        self.delegates.iter().any(|d| d.id.same_key(node))
    }
}

/// A commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Email.
    #[serde(default)]
    pub email: String,
}

/// One entry of `GET /api/v1/projects/{rid}/commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    /// Commit id.
    pub id: CommitSha,
    /// First line of the message.
    #[serde(default)]
    pub summary: String,
    /// Author.
    #[serde(default)]
    pub author: Person,
}

/// `GET /api/v1/projects/{rid}/blob/{sha}/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// Whether `content` is base64-encoded binary data.
    #[serde(default)]
    pub binary: bool,
    /// File name.
    #[serde(default)]
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// File content; base64 when `binary` is set.
    #[serde(default)]
    pub content: String,
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A file.
    Blob,
    /// A directory.
    Tree,
    /// A submodule or anything newer.
    #[serde(other)]
    Other,
}

/// One entry of a [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeEntry {
    /// Path relative to the repository root.
    pub path: String,
    /// Entry name.
    pub name: String,
    /// Entry kind.
    pub kind: EntryKind,
    /// Object id.
    #[serde(default)]
    pub oid: Option<String>,
}

/// `GET /api/v1/projects/{rid}/tree/{sha}/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    /// Directory entries.
    pub entries: Vec<TreeEntry>,
    /// Path of the directory.
    #[serde(default)]
    pub path: String,
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Author of a patch or revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Author identity.
    pub id: NodeId,
    /// Author alias.
    #[serde(default)]
    pub alias: Option<String>,
}

impl Author {
    /// Alias if known, identity otherwise.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.id.as_str())
    }
}

/// State of a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchState {
    /// `"open"`, `"draft"`, `"archived"` or `"merged"`.
    pub status: String,
}

/// One revision of a [`Patch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// Revision id.
    pub id: RevisionId,
    /// Revision description.
    #[serde(default)]
    pub description: String,
    /// Base commit.
    #[serde(default)]
    pub base: Option<CommitSha>,
    /// Head commit.
    pub oid: CommitSha,
    /// Creation time, Unix seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// One entry of `GET /api/v1/projects/{rid}/patches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    /// Patch id.
    pub id: PatchId,
    /// Patch author.
    pub author: Author,
    /// Patch title.
    pub title: String,
    /// Patch state.
    pub state: PatchState,
    /// Merge target (e.g. `"delegates"`).
    #[serde(default)]
    pub target: String,
    /// Revisions, oldest first.
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

/// Paging for node list calls. Pages are 0-based on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePage {
    /// 0-based page.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// A webhook registration on a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoWebhook {
    /// Repository the hook belongs to.
    pub repo_id: RepositoryId,
    /// Callback URL deliveries are sent to.
    pub url: String,
    /// Signing secret.
    #[serde(default)]
    pub secret: HookSecret,
    /// Content type of deliveries.
    pub content_type: String,
}

impl RepoWebhook {
    /// Returns `true` if `other` delivers to the same URL with the same secret
    /// and content type.
    pub fn matches(&self, other: &RepoWebhook) -> bool {
        self.url == other.url
            && self.secret == other.secret
            && self.content_type == other.content_type
    }
}

/// Body of `PATCH /api/v1/projects/{rid}/patches/{id}` adding a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchComment {
    /// Always [`PATCH_COMMENT_TYPE`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Comment body.
    pub body: String,
    /// Revision the comment is attached to.
    pub revision: RevisionId,
}

impl PatchComment {
    /// Creates a revision comment.
    pub fn new(body: impl Into<String>, revision: RevisionId) -> Self {
        Self {
            kind: PATCH_COMMENT_TYPE.to_string(),
            body: body.into(),
            revision,
        }
    }
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// The Radicle node's HTTP API, as used by the adapter.
///
/// Calls made on behalf of a user carry that user's [`SessionToken`].
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Fetches the node's identity and configuration.
    async fn node_info(&self) -> Result<NodeInfo, NodeApiError>;

    /// Fetches the status of a session.
    async fn session_info(&self, token: &SessionToken) -> Result<SessionInfo, NodeApiError>;

    /// Fetches one repository.
    async fn project(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
    ) -> Result<Project, NodeApiError>;

    /// Lists all repositories the node seeds.
    async fn projects(&self, token: &SessionToken) -> Result<Vec<Project>, NodeApiError>;

    /// Lists commits of the default branch, newest first.
    async fn commits(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        page: NodePage,
    ) -> Result<Vec<CommitSummary>, NodeApiError>;

    /// Fetches a file at a commit.
    async fn blob(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        commit: &CommitSha,
        path: &str,
    ) -> Result<Blob, NodeApiError>;

    /// Lists a directory at a commit.
    async fn tree(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        commit: &CommitSha,
        path: &str,
    ) -> Result<Tree, NodeApiError>;

    /// Lists open patches.
    async fn patches(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        page: NodePage,
    ) -> Result<Vec<Patch>, NodeApiError>;

    /// Lists webhook registrations. A repository without hooks yields an
    /// empty list.
    async fn webhooks(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
    ) -> Result<Vec<RepoWebhook>, NodeApiError>;

    /// Registers a webhook.
    async fn add_webhook(
        &self,
        token: &SessionToken,
        hook: &RepoWebhook,
    ) -> Result<(), NodeApiError>;

    /// Removes the webhook delivering to `url`.
    async fn remove_webhook(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        url: &str,
    ) -> Result<(), NodeApiError>;

    /// Adds a comment to a patch revision.
    async fn add_patch_comment(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        patch: &PatchId,
        comment: &PatchComment,
    ) -> Result<(), NodeApiError>;
}
