use std::time::Duration;

use async_trait::async_trait;
use forge::node::{
    Blob, CommitSummary, NodeInfo, NodePage, Patch, PatchComment, Project, RepoWebhook,
    SessionInfo, Tree,
};
use forge::{CommitSha, NodeApi, NodeApiError, PatchId, RepositoryId, SessionToken};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Path segments every node endpoint lives under.
const API_SEGMENTS: [&str; 2] = ["api", "v1"];

/// Longest error body kept in [`NodeApiError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// `reqwest` rejected the client configuration.
    #[error("failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    /// The node URL is not an absolute URL that can carry a path.
    #[error("invalid node URL '{url}': {message}")]
    BaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },
}

/// [`NodeApi`] over a node's HTTP API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct RadicleClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RadicleClient {
    /// Creates a client for the node at `base_url`.
    ///
    /// `timeout` bounds every request end to end.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if `base_url` is not an absolute URL with a
    /// path, or if the HTTP client cannot be created.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::BaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl {
                url: base_url.to_string(),
                message: "URL cannot carry a path".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("radicle-woodpecker/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
        })
    }

    /// Builds the URL of an API endpoint. Each segment is percent-encoded, so
    /// `/`, `?` and `#` inside a segment stay part of it.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects URLs that cannot carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_SEGMENTS).extend(segments);
        }
        url
    }

    fn project_endpoint<'a>(
        &self,
        rid: &'a RepositoryId,
        rest: impl IntoIterator<Item = &'a str>,
    ) -> Url {
        self.endpoint(["projects", rid.as_str()].into_iter().chain(rest))
    }

    fn request(&self, method: Method, endpoint: Url, token: Option<&SessionToken>) -> RequestBuilder {
        let builder = self.http.request(method, endpoint);
        match token {
            Some(token) if !token.is_empty() => builder.bearer_auth(token.expose()),
            _ => builder,
        }
    }

    /// Sends a request and maps transport failures and non-success statuses.
    async fn send(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
    ) -> Result<reqwest::Response, NodeApiError> {
        let response = builder.send().await.map_err(|e| transport_error(endpoint, &e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(NodeApiError::NotFound {
                resource: endpoint.to_string(),
            });
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(NodeApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// GETs `endpoint` and decodes the JSON body. Failures are reported
    /// against `label`.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: Url,
        label: &str,
        token: Option<&SessionToken>,
        query: &[(&str, String)],
    ) -> Result<T, NodeApiError> {
        let builder = self.request(Method::GET, endpoint, token).query(query);
        let response = self.send(builder, label).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(label, &e))?;
        serde_json::from_slice(&bytes).map_err(|e| NodeApiError::Decode {
            endpoint: label.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Url,
        token: Option<&SessionToken>,
        query: &[(&str, String)],
    ) -> Result<T, NodeApiError> {
        let label = endpoint.path().to_string();
        self.fetch_json(endpoint, &label, token, query).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: Url,
        token: &SessionToken,
        body: &B,
    ) -> Result<(), NodeApiError> {
        let label = endpoint.path().to_string();
        let builder = self.request(method, endpoint, Some(token)).json(body);
        self.send(builder, &label).await.map(|_| ())
    }
}

fn transport_error(endpoint: &str, e: &reqwest::Error) -> NodeApiError {
    if e.is_timeout() {
        NodeApiError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        NodeApiError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    }
}

fn page_query(page: NodePage) -> [(&'static str, String); 2] {
    [
        ("page", page.page.to_string()),
        ("perPage", page.per_page.to_string()),
    ]
}

/// Splits a repository path into URL segments, dropping empty ones.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Serialize)]
struct RemoveWebhookRequest<'a> {
    url: &'a str,
}

#[async_trait]
impl NodeApi for RadicleClient {
    #[instrument(skip(self))]
    async fn node_info(&self) -> Result<NodeInfo, NodeApiError> {
        self.get_json(self.endpoint(["node"]), None, &[]).await
    }

    #[instrument(skip(self, token))]
    async fn session_info(&self, token: &SessionToken) -> Result<SessionInfo, NodeApiError> {
        let endpoint = self.endpoint(["sessions", token.expose()]);
        // The token is part of the path; report failures without it.
        let redacted = format!("{}/<token>", self.endpoint(["sessions"]).path());
        self.fetch_json(endpoint, &redacted, Some(token), &[]).await
    }

    #[instrument(skip(self, token), fields(rid = %rid))]
    async fn project(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
    ) -> Result<Project, NodeApiError> {
        self.get_json(self.project_endpoint(rid, []), Some(token), &[])
            .await
    }

    #[instrument(skip(self, token))]
    async fn projects(&self, token: &SessionToken) -> Result<Vec<Project>, NodeApiError> {
        let projects: Vec<Project> = self
            .get_json(
                self.endpoint(["projects"]),
                Some(token),
                &[("show", "all".to_string())],
            )
            .await?;
        debug!(count = projects.len(), "Listed projects");
        Ok(projects)
    }

    #[instrument(skip(self, token), fields(rid = %rid))]
    async fn commits(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        page: NodePage,
    ) -> Result<Vec<CommitSummary>, NodeApiError> {
        let endpoint = self.project_endpoint(rid, ["commits"]);
        self.get_json(endpoint, Some(token), &page_query(page)).await
    }

    #[instrument(skip(self, token), fields(rid = %rid, commit = %commit))]
    async fn blob(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        commit: &CommitSha,
        path: &str,
    ) -> Result<Blob, NodeApiError> {
        let segments = ["blob", commit.as_str()].into_iter().chain(path_segments(path));
        let endpoint = self.project_endpoint(rid, segments);
        self.get_json(endpoint, Some(token), &[]).await
    }

    #[instrument(skip(self, token), fields(rid = %rid, commit = %commit))]
    async fn tree(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        commit: &CommitSha,
        path: &str,
    ) -> Result<Tree, NodeApiError> {
        let segments = ["tree", commit.as_str()].into_iter().chain(path_segments(path));
        let endpoint = self.project_endpoint(rid, segments);
        self.get_json(endpoint, Some(token), &[]).await
    }

    #[instrument(skip(self, token), fields(rid = %rid))]
    async fn patches(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        page: NodePage,
    ) -> Result<Vec<Patch>, NodeApiError> {
        let endpoint = self.project_endpoint(rid, ["patches"]);
        let [page_param, per_page_param] = page_query(page);
        let query = [("state", "open".to_string()), page_param, per_page_param];
        self.get_json(endpoint, Some(token), &query).await
    }

    #[instrument(skip(self, token), fields(rid = %rid))]
    async fn webhooks(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
    ) -> Result<Vec<RepoWebhook>, NodeApiError> {
        let endpoint = self.project_endpoint(rid, ["webhooks"]);
        match self.get_json(endpoint, Some(token), &[]).await {
            Err(NodeApiError::NotFound { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    #[instrument(skip(self, token, hook), fields(rid = %hook.repo_id, url = %hook.url))]
    async fn add_webhook(
        &self,
        token: &SessionToken,
        hook: &RepoWebhook,
    ) -> Result<(), NodeApiError> {
        let endpoint = self.project_endpoint(&hook.repo_id, ["webhooks"]);
        self.send_json(Method::POST, endpoint, token, hook).await
    }

    #[instrument(skip(self, token), fields(rid = %rid))]
    async fn remove_webhook(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        url: &str,
    ) -> Result<(), NodeApiError> {
        let endpoint = self.project_endpoint(rid, ["webhooks"]);
        match self
            .send_json(Method::DELETE, endpoint, token, &RemoveWebhookRequest { url })
            .await
        {
            Err(NodeApiError::NotFound { .. }) => {
                debug!("Webhook already absent");
                Ok(())
            }
            other => other,
        }
    }

    #[instrument(skip(self, token, comment), fields(rid = %rid, patch = %patch))]
    async fn add_patch_comment(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        patch: &PatchId,
        comment: &PatchComment,
    ) -> Result<(), NodeApiError> {
        let endpoint = self.project_endpoint(rid, ["patches", patch.as_str()]);
        self.send_json(Method::PATCH, endpoint, token, comment).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
