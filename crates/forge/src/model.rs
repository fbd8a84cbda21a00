//! The CI server's view of forge objects.
//!
//! These are the shapes the CI server consumes from any forge. The adapter
//! produces them from Radicle API responses (see `addon::convert`) and from
//! canonical webhook events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    BranchName, CommitSha, NodeId, PatchId, PipelineNumber, PipelineStatus, RepositoryId,
    RevisionId, SessionStatus, SessionToken,
};

/// Pipeline variable carrying the patch a pipeline was triggered for.
pub const PATCH_ID_VARIABLE: &str = "patch_id";

/// Pipeline variable carrying the patch revision a pipeline was triggered for.
pub const REVISION_ID_VARIABLE: &str = "revision_id";

// ---------------------------------------------------------------------------
// Session and user
// ---------------------------------------------------------------------------

/// An established node session.
///
/// Returned by the login flow and carried by the caller from then on; the
/// adapter never stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Token the node authorized.
    pub token: SessionToken,
    /// Status reported by the node when the session was checked.
    pub status: SessionStatus,
    /// Identity of the node the session belongs to.
    pub node_id: NodeId,
    /// Display alias of the user who authorized the session.
    pub alias: String,
}

/// A CI server user backed by a node session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name shown by the CI server (the session alias).
    pub login: String,
    /// Node identity the session is bound to.
    pub forge_remote_id: NodeId,
    /// Session token used for every call made on the user's behalf.
    pub access_token: SessionToken,
}

impl User {
    /// Builds the user for an established session.
    pub fn from_session(session: Session) -> Self {
        Self {
            login: session.alias,
            forge_remote_id: session.node_id,
            access_token: session.token,
        }
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// The user's permissions on a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Perm {
    /// May read.
    pub pull: bool,
    /// May push.
    pub push: bool,
    /// Is a delegate.
    pub admin: bool,
}

/// A repository as the CI server sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    /// CI-server-assigned id; `0` until the CI server has stored the repo.
    pub id: u64,
    /// The Radicle RID.
    pub forge_remote_id: RepositoryId,
    /// Owner shown by the CI server (the node alias or id).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Default branch, the only branch the node announces.
    pub branch: BranchName,
    /// Web URL of the repository on the node.
    pub forge_url: String,
    /// Git clone URL.
    pub clone_url: String,
    /// Whether the repository is private.
    pub is_private: bool,
    /// The requesting user's permissions.
    pub perm: Perm,
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// A pipeline the CI server created, as passed back to the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Sequential number within the repository.
    pub number: PipelineNumber,
    /// Current status.
    pub status: PipelineStatus,
    /// Commit the pipeline runs on.
    pub commit: CommitSha,
    /// Branch the pipeline runs for.
    pub branch: BranchName,
    /// Variables recorded when the pipeline was triggered.
    #[serde(default)]
    pub additional_variables: BTreeMap<String, String>,
}

impl Pipeline {
    /// Returns the patch and revision the pipeline was triggered for.
    ///
    /// `None` unless both variables are present and non-empty.
    pub fn patch_target(&self) -> Option<(PatchId, RevisionId)> {
        let patch = self
            .additional_variables
            .get(PATCH_ID_VARIABLE)
            .and_then(|v| PatchId::new(v.as_str()))?;
        let revision = self
            .additional_variables
            .get(REVISION_ID_VARIABLE)
            .and_then(|v| RevisionId::new(v.as_str()))?;
        Some((patch, revision))
    }
}

/// Kind of event a pipeline is triggered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A push to the default branch.
    Push,
    /// A new patch or patch revision.
    PullRequest,
}

/// A request to create a pipeline, produced from a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTrigger {
    /// What happened.
    pub event: TriggerEvent,
    /// Commit to build.
    pub commit: CommitSha,
    /// Branch the commit belongs to (the patch target for patches).
    pub branch: BranchName,
    /// Git ref to fetch.
    pub git_ref: String,
    /// Web URL of the commit or patch.
    pub forge_url: String,
    /// Commit message or patch title.
    pub message: String,
    /// Alias or id of whoever caused the event.
    pub author: String,
    /// Variables that must be handed back with the [`Pipeline`].
    #[serde(default)]
    pub additional_variables: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Content and misc.
// ---------------------------------------------------------------------------

/// The head commit of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit id.
    pub sha: CommitSha,
    /// Web URL of the commit; empty when the node has none.
    pub forge_url: String,
}

/// One entry of a directory listing, with its content for files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    /// Path relative to the repository root.
    pub name: String,
    /// File content; empty for directories.
    pub data: Vec<u8>,
}

/// A patch presented as a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// The patch id.
    pub index: PatchId,
    /// The patch title.
    pub title: String,
}

/// Credentials written to `.netrc` for cloning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netrc {
    /// Host to authenticate against.
    pub machine: String,
    /// Login name.
    pub login: String,
    /// Password; always empty for Radicle.
    pub password: String,
}

/// An organization. Radicle has none, so this is always the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    /// Name.
    pub name: String,
    /// Whether the "organization" is a user account.
    pub is_user: bool,
}

/// A user's standing in an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgPerm {
    /// Is a member.
    pub member: bool,
    /// Is an admin.
    pub admin: bool,
}

/// A team membership. Radicle has no teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team login.
    pub login: String,
    /// Avatar URL.
    pub avatar: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(vars: &[(&str, &str)]) -> Pipeline {
        Pipeline {
            number: PipelineNumber::new(1),
            status: PipelineStatus::Success,
            commit: CommitSha::new("abc").unwrap(),
            branch: BranchName::new("main").unwrap(),
            additional_variables: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_patch_target_requires_both_variables() {
        assert!(pipeline(&[]).patch_target().is_none());
        assert!(pipeline(&[(PATCH_ID_VARIABLE, "p1")]).patch_target().is_none());
        assert!(pipeline(&[(REVISION_ID_VARIABLE, "r1")]).patch_target().is_none());
        assert!(pipeline(&[(PATCH_ID_VARIABLE, ""), (REVISION_ID_VARIABLE, "r1")])
            .patch_target()
            .is_none());

        let (patch, revision) = pipeline(&[(PATCH_ID_VARIABLE, "p1"), (REVISION_ID_VARIABLE, "r1")])
            .patch_target()
            .unwrap();
        assert_eq!(patch.as_str(), "p1");
        assert_eq!(revision.as_str(), "r1");
    }
}
