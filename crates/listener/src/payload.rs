//! JSON schemas of the node's push and patch deliveries.
//!
//! Push:
//!
//! ```json
//! {
//!   "repository": { "id": "rad:z…", "name": "…", "default_branch": "main", … },
//!   "pusher": { "id": "did:key:…", "alias": "alice" },
//!   "branch": "main",
//!   "before": "<sha>",
//!   "after": "<sha>",
//!   "commits": [{ "id": "<sha>", "message": "…", "url": "…" }]
//! }
//! ```
//!
//! Patch:
//!
//! ```json
//! {
//!   "action": "created",
//!   "repository": { … },
//!   "patch": {
//!     "id": "<patch id>", "title": "…", "url": "…",
//!     "author": { "id": "did:key:…", "alias": "bob" },
//!     "revisions": [{ "id": "<revision id>", "oid": "<sha>" }]
//!   }
//! }
//! ```

use forge::{
    BranchName, CommitSha, HookRepository, NodeId, PatchEvent, PatchId, PushEvent, RepositoryId,
    RevisionId,
};
use serde::Deserialize;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryPayload {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    default_branch: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    clone_url: String,
    #[serde(default)]
    delegates: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorPayload {
    id: String,
    #[serde(default)]
    alias: Option<String>,
}

impl ActorPayload {
    fn display_name(self) -> String {
        self.alias.filter(|a| !a.is_empty()).unwrap_or(self.id)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitPayload {
    id: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PushPayload {
    repository: RepositoryPayload,
    #[serde(default)]
    pusher: Option<ActorPayload>,
    #[serde(default)]
    branch: Option<String>,
    after: String,
    #[serde(default)]
    commits: Vec<CommitPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevisionPayload {
    id: String,
    #[serde(default)]
    oid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchBody {
    id: String,
    #[serde(default)]
    title: String,
    author: ActorPayload,
    #[serde(default)]
    url: String,
    #[serde(default)]
    after: Option<String>,
    revisions: Vec<RevisionPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchPayload {
    #[serde(default)]
    action: String,
    repository: RepositoryPayload,
    patch: PatchBody,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("{field} is missing or empty"))
}

impl RepositoryPayload {
    fn into_hook_repository(self) -> Result<HookRepository, String> {
        Ok(HookRepository {
            id: required(RepositoryId::new(self.id), "repository.id")?,
            name: self.name,
            description: self.description,
            default_branch: required(
                BranchName::new(self.default_branch),
                "repository.default_branch",
            )?,
            private: self.private,
            url: self.url,
            clone_url: self.clone_url,
            delegates: self.delegates.into_iter().filter_map(NodeId::new).collect(),
        })
    }
}

impl PushPayload {
    /// Validates the payload into a [`PushEvent`].
    pub(crate) fn into_event(self) -> Result<PushEvent, String> {
        let repository = self.repository.into_hook_repository()?;
        let head_commit = required(CommitSha::new(self.after), "after")?;

        let branch = match self.branch.filter(|b| !b.is_empty()) {
            Some(branch) => {
                let name = branch.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(&branch);
                required(BranchName::new(name), "branch")?
            }
            None => repository.default_branch.clone(),
        };

        let head = self
            .commits
            .into_iter()
            .find(|c| c.id == head_commit.as_str());
        let (message, commit_url) = head.map(|c| (c.message, c.url)).unwrap_or_default();

        Ok(PushEvent {
            repository,
            branch,
            head_commit,
            message,
            commit_url,
            pusher: self.pusher.map(ActorPayload::display_name).unwrap_or_default(),
        })
    }
}

impl PatchPayload {
    /// Validates the payload into a [`PatchEvent`].
    ///
    /// The event describes the latest revision; patches always target the
    /// repository's default branch.
    pub(crate) fn into_event(self) -> Result<PatchEvent, String> {
        let repository = self.repository.into_hook_repository()?;
        let patch = self.patch;
        let patch_id = required(PatchId::new(patch.id), "patch.id")?;

        let latest = required(patch.revisions.into_iter().last(), "patch.revisions")?;
        let revision_id = required(RevisionId::new(latest.id), "patch.revisions[].id")?;
        let head_commit = required(
            latest.oid.or(patch.after).and_then(CommitSha::new),
            "patch.revisions[].oid",
        )?;

        Ok(PatchEvent {
            branch: repository.default_branch.clone(),
            repository,
            patch_id,
            revision_id,
            head_commit,
            action: self.action,
            title: patch.title,
            author: patch.author.display_name(),
            url: patch.url,
        })
    }
}
