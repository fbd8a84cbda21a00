//! [`RadicleForge`], the [`Forge`] implementation.
//!
//! Reads go straight to the node with the caller's session token. Login,
//! webhooks and status reporting are delegated to their components.

use std::sync::Arc;

use async_trait::async_trait;
use forge::node::{EntryKind, NodePage};
use forge::{
    BranchName, Commit, DispatchOutcome, FileMeta, Forge, ForgeConfig, ForgeError, HookDelivery,
    HookOutcome, ListOptions, LoginError, LoginRequest, LoginResponse, Netrc, NodeApi,
    NodeApiError, Org, OrgPerm, Pipeline, PullRequest, Repo, RepositoryId, Team, User,
};
use listener::HookReceiver;
use tracing::{debug, instrument};

use crate::convert;
use crate::session::SessionNegotiator;
use crate::status::StatusReporter;
use crate::webhooks::WebhookLifecycle;

/// Driver name reported to the CI server.
pub const FORGE_NAME: &str = "radicle";

/// The Radicle [`Forge`].
///
/// Holds configuration and the node client only; the session of each call
/// arrives with its [`User`].
#[derive(Clone)]
pub struct RadicleForge {
    config: ForgeConfig,
    node: Arc<dyn NodeApi>,
    receiver: HookReceiver,
    sessions: SessionNegotiator,
    webhooks: WebhookLifecycle,
    reporter: StatusReporter,
}

impl RadicleForge {
    /// Creates the forge for `config`, talking to the node through `node`.
    pub fn new(config: ForgeConfig, node: Arc<dyn NodeApi>) -> Self {
        Self {
            receiver: HookReceiver::new(config.hook_secret().clone()),
            sessions: SessionNegotiator::new(node.clone(), config.login_url()),
            webhooks: WebhookLifecycle::new(node.clone(), config.hook_secret().clone()),
            reporter: StatusReporter::new(node.clone(), config.clone()),
            config,
            node,
        }
    }

    /// The adapter configuration.
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    async fn find_project(
        &self,
        user: &User,
        remote_id: Option<&RepositoryId>,
        name: &str,
    ) -> Result<forge::node::Project, ForgeError> {
        let token = &user.access_token;
        if let Some(rid) = remote_id {
            return Ok(self.node.project(token, rid).await?);
        }
        self.node
            .projects(token)
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| {
                ForgeError::Node(NodeApiError::NotFound {
                    resource: format!("repository {name}"),
                })
            })
    }
}

fn node_page(options: ListOptions) -> NodePage {
    NodePage {
        page: options.page.saturating_sub(1),
        per_page: options.per_page,
    }
}

#[async_trait]
impl Forge for RadicleForge {
    fn name(&self) -> &str {
        FORGE_NAME
    }

    fn url(&self) -> &str {
        self.config.node_url()
    }

    async fn login(&self, request: Option<&LoginRequest>) -> Result<LoginResponse, LoginError> {
        self.sessions.login(request).await
    }

    async fn auth(&self, _token: &str, _secret: &str) -> Result<String, ForgeError> {
        Ok(String::new())
    }

    async fn teams(&self, _user: &User) -> Result<Vec<Team>, ForgeError> {
        Ok(Vec::new())
    }

    #[instrument(skip(self, user), fields(login = %user.login))]
    async fn repo(
        &self,
        user: &User,
        remote_id: Option<&RepositoryId>,
        _owner: &str,
        name: &str,
    ) -> Result<Repo, ForgeError> {
        let project = self.find_project(user, remote_id, name).await?;
        Ok(convert::project_to_repo(&self.config, user, project))
    }

    #[instrument(skip_all, fields(login = %user.login))]
    async fn repos(&self, user: &User) -> Result<Vec<Repo>, ForgeError> {
        let projects = self.node.projects(&user.access_token).await?;
        Ok(projects
            .into_iter()
            .map(|p| convert::project_to_repo(&self.config, user, p))
            .collect())
    }

    #[instrument(skip(self, user, repo, pipeline), fields(rid = %repo.forge_remote_id, commit = %pipeline.commit))]
    async fn file(
        &self,
        user: &User,
        repo: &Repo,
        pipeline: &Pipeline,
        path: &str,
    ) -> Result<Vec<u8>, ForgeError> {
        let blob = self
            .node
            .blob(
                &user.access_token,
                &repo.forge_remote_id,
                &pipeline.commit,
                path,
            )
            .await?;
        convert::blob_content(blob)
    }

    #[instrument(skip(self, user, repo, pipeline), fields(rid = %repo.forge_remote_id, commit = %pipeline.commit))]
    async fn dir(
        &self,
        user: &User,
        repo: &Repo,
        pipeline: &Pipeline,
        path: &str,
    ) -> Result<Vec<FileMeta>, ForgeError> {
        let tree = self
            .node
            .tree(
                &user.access_token,
                &repo.forge_remote_id,
                &pipeline.commit,
                path,
            )
            .await?;

        let mut files = Vec::with_capacity(tree.entries.len());
        for entry in &tree.entries {
            match entry.kind {
                EntryKind::Blob => files.push(FileMeta {
                    name: entry.path.clone(),
                    data: self.file(user, repo, pipeline, &entry.path).await?,
                }),
                EntryKind::Tree => files.push(convert::directory_entry(entry)),
                EntryKind::Other => debug!(path = %entry.path, "Skipping unsupported tree entry"),
            }
        }
        Ok(files)
    }

    async fn status(
        &self,
        user: &User,
        repo: &Repo,
        pipeline: &Pipeline,
    ) -> Result<(), ForgeError> {
        self.reporter
            .report(&user.access_token, repo, pipeline)
            .await
            .map(|_| ())
    }

    fn netrc(&self, user: &User, _repo: &Repo) -> Result<Netrc, ForgeError> {
        Ok(Netrc {
            machine: self.config.node_url().to_string(),
            login: user.forge_remote_id.to_string(),
            password: String::new(),
        })
    }

    async fn activate(&self, user: &User, repo: &Repo, link: &str) -> Result<(), ForgeError> {
        self.webhooks
            .activate(&user.access_token, &repo.forge_remote_id, link)
            .await
            .map(|_| ())
    }

    async fn deactivate(&self, user: &User, repo: &Repo, link: &str) -> Result<(), ForgeError> {
        self.webhooks
            .deactivate(&user.access_token, &repo.forge_remote_id, link)
            .await
    }

    async fn branches(
        &self,
        _user: &User,
        repo: &Repo,
        options: ListOptions,
    ) -> Result<Vec<BranchName>, ForgeError> {
        // The node announces the default branch only.
        if options.page > 1 {
            return Ok(Vec::new());
        }
        Ok(vec![repo.branch.clone()])
    }

    #[instrument(skip(self, user, repo), fields(rid = %repo.forge_remote_id))]
    async fn branch_head(
        &self,
        user: &User,
        repo: &Repo,
        branch: &BranchName,
    ) -> Result<Commit, ForgeError> {
        if branch != &repo.branch {
            return Err(ForgeError::BranchNotFound {
                branch: branch.clone(),
            });
        }
        let head = self
            .node
            .commits(
                &user.access_token,
                &repo.forge_remote_id,
                NodePage {
                    page: 0,
                    per_page: 1,
                },
            )
            .await?
            .into_iter()
            .next()
            .ok_or(ForgeError::EmptyBranch)?;

        Ok(Commit {
            sha: head.id,
            forge_url: String::new(),
        })
    }

    #[instrument(skip(self, user, repo), fields(rid = %repo.forge_remote_id))]
    async fn pull_requests(
        &self,
        user: &User,
        repo: &Repo,
        options: ListOptions,
    ) -> Result<Vec<PullRequest>, ForgeError> {
        let patches = self
            .node
            .patches(&user.access_token, &repo.forge_remote_id, node_page(options))
            .await?;
        Ok(patches
            .into_iter()
            .map(convert::patch_to_pull_request)
            .collect())
    }

    async fn hook(&self, delivery: &HookDelivery) -> Result<HookOutcome, ForgeError> {
        match self.receiver.receive(delivery)? {
            DispatchOutcome::Event(event) => {
                let (repo, trigger) = convert::event_to_trigger(&self.config, event);
                Ok(HookOutcome::Pipeline {
                    repo: Box::new(repo),
                    trigger: Box::new(trigger),
                })
            }
            DispatchOutcome::Ignored { event } => Ok(HookOutcome::Ignored { event }),
        }
    }

    async fn org_membership(&self, user: &User, org: &str) -> Result<OrgPerm, ForgeError> {
        let own = org == user.login;
        Ok(OrgPerm {
            member: own,
            admin: own,
        })
    }

    async fn org(&self, _user: &User, _name: &str) -> Result<Org, ForgeError> {
        Ok(Org {
            name: FORGE_NAME.to_string(),
            is_user: true,
        })
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
