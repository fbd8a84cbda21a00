//! In-memory [`NodeApi`] and fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use forge::node::{
    Blob, CommitSummary, Delegate, NodeConfig, NodeInfo, NodePage, Patch, PatchComment, Project,
    RepoWebhook, SessionInfo, Tree,
};
use forge::{
    BranchName, CommitSha, ForgeConfig, HookSecret, NodeApi, NodeApiError, NodeId, PatchId, Perm,
    Repo, RepositoryId, SessionStatus, SessionToken, User,
};

pub(crate) const RID: &str = "rad:z3gqcJUoA1n9HaHKufZs5FCSGazv5";
pub(crate) const NODE_ID: &str = "z6MknSLrJoTcukLrE435hVNQT4JUhbvWLX4kUzqkEStBU8Vi";
pub(crate) const TOKEN: &str = "tok-123";
pub(crate) const SECRET: &str = "s3cret";
pub(crate) const HOOK_URL: &str = "https://ci.example.com/api/hook";
pub(crate) const HEAD: &str = "f2de534b5e81d7c6e2dcaf58c3dd91573c0a0354";

pub(crate) fn config() -> ForgeConfig {
    ForgeConfig::new(
        "https://seed.example.com",
        "https://ci.example.com",
        HookSecret::new(SECRET),
    )
    .unwrap()
}

pub(crate) fn rid() -> RepositoryId {
    RepositoryId::new(RID).unwrap()
}

pub(crate) fn token() -> SessionToken {
    SessionToken::new(TOKEN)
}

pub(crate) fn user() -> User {
    User {
        login: "alice".into(),
        forge_remote_id: NodeId::new(NODE_ID).unwrap(),
        access_token: token(),
    }
}

pub(crate) fn project() -> Project {
    Project {
        id: rid(),
        name: "heartwood".into(),
        description: "Radicle heartwood protocol".into(),
        default_branch: BranchName::new("master").unwrap(),
        head: CommitSha::new(HEAD),
        delegates: vec![Delegate {
            id: NodeId::new(format!("did:key:{NODE_ID}")).unwrap(),
            alias: Some("alice".into()),
        }],
        visibility: None,
    }
}

pub(crate) fn repo() -> Repo {
    Repo {
        id: 7,
        forge_remote_id: rid(),
        owner: "alice".into(),
        name: "heartwood".into(),
        full_name: "alice/heartwood".into(),
        branch: BranchName::new("master").unwrap(),
        forge_url: format!("https://seed.example.com/{RID}"),
        clone_url: "https://seed.example.com/z3gqcJUoA1n9HaHKufZs5FCSGazv5.git".into(),
        is_private: false,
        perm: Perm {
            pull: true,
            push: true,
            admin: true,
        },
    }
}

pub(crate) fn authorized_session() -> SessionInfo {
    SessionInfo {
        session_id: TOKEN.into(),
        status: SessionStatus::Authorized,
        public_key: NodeId::new(NODE_ID),
        alias: "alice".into(),
        issued_at: Some(1_700_000_000),
        expires_at: None,
    }
}

pub(crate) fn hook(url: &str, secret: &str) -> RepoWebhook {
    RepoWebhook {
        repo_id: rid(),
        url: url.into(),
        secret: HookSecret::new(secret),
        content_type: forge::node::WEBHOOK_CONTENT_TYPE.into(),
    }
}

/// Canned node state plus a log of every call made.
#[derive(Debug)]
pub(crate) struct FakeState {
    pub node_info: Result<NodeInfo, NodeApiError>,
    /// Sessions by token; unknown tokens are not found.
    pub sessions: HashMap<String, SessionInfo>,
    pub session_error: Option<NodeApiError>,
    pub projects: Vec<Project>,
    pub commits: Vec<CommitSummary>,
    /// Blobs by path.
    pub blobs: HashMap<String, Blob>,
    /// Trees by path.
    pub trees: HashMap<String, Tree>,
    pub patches: Vec<Patch>,
    pub webhooks: Vec<RepoWebhook>,
    pub list_webhooks_error: Option<NodeApiError>,
    pub add_webhook_error: Option<NodeApiError>,
    pub remove_webhook_error: Option<NodeApiError>,
    pub comment_error: Option<NodeApiError>,
    pub comments: Vec<(RepositoryId, PatchId, PatchComment)>,
    pub pages: Vec<NodePage>,
    pub calls: Vec<&'static str>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            node_info: Ok(NodeInfo {
                config: NodeConfig {
                    id: NodeId::new(NODE_ID).unwrap(),
                    alias: Some("seed".into()),
                },
                version: Some("0.9.0".into()),
                state: Some("running".into()),
            }),
            sessions: HashMap::new(),
            session_error: None,
            projects: vec![project()],
            commits: Vec::new(),
            blobs: HashMap::new(),
            trees: HashMap::new(),
            patches: Vec::new(),
            webhooks: Vec::new(),
            list_webhooks_error: None,
            add_webhook_error: None,
            remove_webhook_error: None,
            comment_error: None,
            comments: Vec::new(),
            pages: Vec::new(),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeNode {
    state: Mutex<FakeState>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    fn record(&self, call: &'static str) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }
}

fn not_found(resource: impl Into<String>) -> NodeApiError {
    NodeApiError::NotFound {
        resource: resource.into(),
    }
}

fn fail_with(error: &Option<NodeApiError>) -> Result<(), NodeApiError> {
    match error {
        Some(e) => Err(e.clone()),
        None => Ok(()),
    }
}

#[async_trait]
impl NodeApi for FakeNode {
    async fn node_info(&self) -> Result<NodeInfo, NodeApiError> {
        self.record("node_info").node_info.clone()
    }

    async fn session_info(&self, token: &SessionToken) -> Result<SessionInfo, NodeApiError> {
        let state = self.record("session_info");
        fail_with(&state.session_error)?;
        state
            .sessions
            .get(token.expose())
            .cloned()
            .ok_or_else(|| not_found("session"))
    }

    async fn project(
        &self,
        _token: &SessionToken,
        rid: &RepositoryId,
    ) -> Result<Project, NodeApiError> {
        self.record("project")
            .projects
            .iter()
            .find(|p| &p.id == rid)
            .cloned()
            .ok_or_else(|| not_found(format!("repository {rid}")))
    }

    async fn projects(&self, _token: &SessionToken) -> Result<Vec<Project>, NodeApiError> {
        Ok(self.record("projects").projects.clone())
    }

    async fn commits(
        &self,
        _token: &SessionToken,
        _rid: &RepositoryId,
        page: NodePage,
    ) -> Result<Vec<CommitSummary>, NodeApiError> {
        let mut state = self.record("commits");
        state.pages.push(page);
        Ok(state.commits.clone())
    }

    async fn blob(
        &self,
        _token: &SessionToken,
        _rid: &RepositoryId,
        _commit: &CommitSha,
        path: &str,
    ) -> Result<Blob, NodeApiError> {
        self.record("blob")
            .blobs
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn tree(
        &self,
        _token: &SessionToken,
        _rid: &RepositoryId,
        _commit: &CommitSha,
        path: &str,
    ) -> Result<Tree, NodeApiError> {
        self.record("tree")
            .trees
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn patches(
        &self,
        _token: &SessionToken,
        _rid: &RepositoryId,
        page: NodePage,
    ) -> Result<Vec<Patch>, NodeApiError> {
        let mut state = self.record("patches");
        state.pages.push(page);
        Ok(state.patches.clone())
    }

    async fn webhooks(
        &self,
        _token: &SessionToken,
        _rid: &RepositoryId,
    ) -> Result<Vec<RepoWebhook>, NodeApiError> {
        let state = self.record("webhooks");
        fail_with(&state.list_webhooks_error)?;
        Ok(state.webhooks.clone())
    }

    async fn add_webhook(
        &self,
        _token: &SessionToken,
        hook: &RepoWebhook,
    ) -> Result<(), NodeApiError> {
        let mut state = self.record("add_webhook");
        fail_with(&state.add_webhook_error)?;
        state.webhooks.push(hook.clone());
        Ok(())
    }

    async fn remove_webhook(
        &self,
        _token: &SessionToken,
        _rid: &RepositoryId,
        url: &str,
    ) -> Result<(), NodeApiError> {
        let mut state = self.record("remove_webhook");
        fail_with(&state.remove_webhook_error)?;
        state.webhooks.retain(|h| h.url != url);
        Ok(())
    }

    async fn add_patch_comment(
        &self,
        _token: &SessionToken,
        rid: &RepositoryId,
        patch: &PatchId,
        comment: &PatchComment,
    ) -> Result<(), NodeApiError> {
        let mut state = self.record("add_patch_comment");
        fail_with(&state.comment_error)?;
        state
            .comments
            .push((rid.clone(), patch.clone(), comment.clone()));
        Ok(())
    }
}
