//! HTTP surface of the adapter.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /hook` | Inbound deliveries from the node |
//! | `GET /login?code=…` | Drives the session login flow |
//! | `GET /healthz` | Liveness probe |
//!
//! Accepted deliveries are handed to a [`PipelineSink`], the port through
//! which the CI server's pipeline engine receives triggers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use forge::{
    DeliveryId, Forge, ForgeError, HookDelivery, HookError, HookOutcome, LoginError, LoginRequest,
    NodeId, PipelineTrigger, Repo,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use crate::signature::SIGNATURE_HEADER;

/// Header carrying the delivery's event-type label.
pub const EVENT_TYPE_HEADER: &str = "X-Radicle-Event-Type";

// ---------------------------------------------------------------------------
// Pipeline sink port
// ---------------------------------------------------------------------------

/// The pipeline engine rejected a trigger.
#[derive(Debug, Error)]
#[error("pipeline sink rejected trigger: {message}")]
pub struct SinkError {
    /// Why the trigger was rejected.
    pub message: String,
}

impl SinkError {
    /// Creates a new [`SinkError`].
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives the pipeline triggers of accepted deliveries.
#[async_trait]
pub trait PipelineSink: Send + Sync {
    /// Queues a pipeline for `repo`.
    async fn submit(
        &self,
        delivery: DeliveryId,
        repo: Repo,
        trigger: PipelineTrigger,
    ) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// State and router
// ---------------------------------------------------------------------------

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    forge: Arc<dyn Forge>,
    sink: Arc<dyn PipelineSink>,
}

impl AppState {
    /// Creates handler state.
    pub fn new(forge: Arc<dyn Forge>, sink: Arc<dyn PipelineSink>) -> Self {
        Self { forge, sink }
    }
}

/// Builds the router with tracing of every request.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/hook", post(hook_handler))
        .route("/login", get(login_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves the router until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening for webhook deliveries");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Body of an accepted or ignored delivery.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HookResponse {
    /// `"accepted"` or `"ignored"`.
    pub status: String,
    /// Correlation id of the delivery.
    pub delivery_id: String,
    /// Event label of an ignored delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[instrument(skip_all)]
async fn hook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let delivery = HookDelivery::new(
        header_value(&headers, EVENT_TYPE_HEADER),
        header_value(&headers, SIGNATURE_HEADER),
        body.to_vec(),
    );
    let delivery_id = delivery.id;

    match state.forge.hook(&delivery).await? {
        HookOutcome::Pipeline { repo, trigger } => {
            state
                .sink
                .submit(delivery_id, *repo, *trigger)
                .await
                .map_err(ApiError::Sink)?;
            info!(%delivery_id, "Delivery accepted");
            let body = HookResponse {
                status: "accepted".into(),
                delivery_id: delivery_id.to_string(),
                event: None,
            };
            Ok((StatusCode::OK, Json(body)).into_response())
        }
        HookOutcome::Ignored { event } => {
            let body = HookResponse {
                status: "ignored".into(),
                delivery_id: delivery_id.to_string(),
                event: Some(event),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

/// Query string of `GET /login`.
#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    code: Option<String>,
}

/// The logged-in user as shown to the browser. Never includes the token.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginUser {
    /// Session alias.
    pub login: String,
    /// Node identity.
    pub node_id: NodeId,
}

/// Body of a successful login.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginBody {
    /// The logged-in user.
    pub user: LoginUser,
    /// URL to obtain a fresh session token.
    pub login_url: String,
}

async fn login_handler(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, ApiError> {
    let request = LoginRequest { code: query.code };
    let response = state.forge.login(Some(&request)).await?;

    match response.user {
        Some(user) => {
            let body = LoginBody {
                user: LoginUser {
                    login: user.login,
                    node_id: user.forge_remote_id,
                },
                login_url: response.login_url,
            };
            Ok(Json(body).into_response())
        }
        None => Ok(Redirect::to(&response.login_url).into_response()),
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of a failed request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Generic error message.
    pub error: String,
    /// URL to obtain a session token; set for login failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

/// Handler failures and their HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A forge operation failed.
    #[error(transparent)]
    Forge(#[from] ForgeError),

    /// The login flow failed.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// The pipeline engine rejected the trigger.
    #[error(transparent)]
    Sink(SinkError),
}

fn forge_status(error: &ForgeError) -> StatusCode {
    match error {
        ForgeError::Hook(e) if e.is_authentication() => StatusCode::UNAUTHORIZED,
        ForgeError::Hook(HookError::Parse { .. }) => StatusCode::BAD_REQUEST,
        ForgeError::Unauthorized => StatusCode::UNAUTHORIZED,
        ForgeError::Node(_)
        | ForgeError::RepositoryLookup(_)
        | ForgeError::Activation(_)
        | ForgeError::Deactivation(_) => StatusCode::BAD_GATEWAY,
        ForgeError::Hook(_)
        | ForgeError::BranchNotFound { .. }
        | ForgeError::EmptyBranch
        | ForgeError::Content { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// - signature failures and unauthorized sessions: 401
    /// - unparseable deliveries: 400
    /// - node or pipeline engine failures: 502
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forge(e) => forge_status(e),
            Self::Login(e) => match forge_status(&e.source) {
                StatusCode::BAD_GATEWAY => StatusCode::BAD_GATEWAY,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::Sink(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, %status, "Request failed");
        } else {
            warn!(error = %self, %status, "Request rejected");
        }

        // Node response bodies can appear in error messages; only the
        // client-caused failures echo their message.
        let error = match &self {
            Self::Forge(ForgeError::Hook(e)) => e.to_string(),
            Self::Forge(ForgeError::Unauthorized) => self.to_string(),
            Self::Login(e) if status == StatusCode::UNAUTHORIZED => e.to_string(),
            Self::Forge(_) | Self::Login(_) => "upstream node request failed".to_string(),
            Self::Sink(_) => "pipeline could not be created".to_string(),
        };
        let login_url = match self {
            Self::Login(e) => Some(e.login_url),
            Self::Forge(_) | Self::Sink(_) => None,
        };

        (status, Json(ErrorBody { error, login_url })).into_response()
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
