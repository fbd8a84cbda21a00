//! The CI server's forge interface.
//!
//! [`Forge`] is what the CI server calls: login, repository reads, webhook
//! activation, status reporting and delivery parsing. Every operation that
//! acts for a user receives that [`User`]; implementations keep no session
//! state of their own.

use async_trait::async_trait;

use crate::errors::{ForgeError, LoginError};
use crate::events::{HookDelivery, HookOutcome};
use crate::model::{
    Commit, FileMeta, Netrc, Org, OrgPerm, Pipeline, PullRequest, Repo, Team, User,
};
use crate::{BranchName, ListOptions, RepositoryId};

/// A login attempt from the CI server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRequest {
    /// Session token the user obtained from the node's authorization UI.
    pub code: Option<String>,
}

/// A completed login step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    /// The logged-in user, once a session is authorized.
    pub user: Option<User>,
    /// URL the user can follow to (re-)obtain a session token.
    pub login_url: String,
}

/// Operations the CI server performs against a forge.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Short driver name.
    fn name(&self) -> &str;

    /// Base URL of the forge.
    fn url(&self) -> &str;

    /// Drives the login flow. `None` means the user has not started one.
    async fn login(&self, request: Option<&LoginRequest>) -> Result<LoginResponse, LoginError>;

    /// Exchanges an OAuth token and secret for a login name.
    async fn auth(&self, token: &str, secret: &str) -> Result<String, ForgeError>;

    /// Lists the user's team memberships.
    async fn teams(&self, user: &User) -> Result<Vec<Team>, ForgeError>;

    /// Fetches a repository by remote id, falling back to its name.
    async fn repo(
        &self,
        user: &User,
        remote_id: Option<&RepositoryId>,
        owner: &str,
        name: &str,
    ) -> Result<Repo, ForgeError>;

    /// Lists the repositories visible to the user.
    async fn repos(&self, user: &User) -> Result<Vec<Repo>, ForgeError>;

    /// Fetches a file at the pipeline's commit.
    async fn file(
        &self,
        user: &User,
        repo: &Repo,
        pipeline: &Pipeline,
        path: &str,
    ) -> Result<Vec<u8>, ForgeError>;

    /// Fetches a directory at the pipeline's commit, with file contents.
    async fn dir(
        &self,
        user: &User,
        repo: &Repo,
        pipeline: &Pipeline,
        path: &str,
    ) -> Result<Vec<FileMeta>, ForgeError>;

    /// Reports the pipeline's status back to the forge.
    async fn status(&self, user: &User, repo: &Repo, pipeline: &Pipeline)
        -> Result<(), ForgeError>;

    /// Returns `.netrc` credentials for cloning.
    fn netrc(&self, user: &User, repo: &Repo) -> Result<Netrc, ForgeError>;

    /// Ensures the repository delivers webhooks to `link`.
    async fn activate(&self, user: &User, repo: &Repo, link: &str) -> Result<(), ForgeError>;

    /// Stops the repository delivering webhooks to `link`.
    async fn deactivate(&self, user: &User, repo: &Repo, link: &str) -> Result<(), ForgeError>;

    /// Lists branch names.
    async fn branches(
        &self,
        user: &User,
        repo: &Repo,
        options: ListOptions,
    ) -> Result<Vec<BranchName>, ForgeError>;

    /// Returns the head commit of a branch.
    async fn branch_head(
        &self,
        user: &User,
        repo: &Repo,
        branch: &BranchName,
    ) -> Result<Commit, ForgeError>;

    /// Lists open pull requests.
    async fn pull_requests(
        &self,
        user: &User,
        repo: &Repo,
        options: ListOptions,
    ) -> Result<Vec<PullRequest>, ForgeError>;

    /// Authenticates and parses a webhook delivery.
    async fn hook(&self, delivery: &HookDelivery) -> Result<HookOutcome, ForgeError>;

    /// Returns the user's standing in an organization.
    async fn org_membership(&self, user: &User, org: &str) -> Result<OrgPerm, ForgeError>;

    /// Fetches an organization by name.
    async fn org(&self, user: &User, name: &str) -> Result<Org, ForgeError>;
}
