//! Session login against the node's authorization flow.
//!
//! The node issues session tokens from its own UI. The user brings a token
//! back as the login `code`; the negotiator checks the node is reachable,
//! then asks the node whether the token is authorized.
//!
//! ```text
//! NoSession ──node reachable, code given──▶ PendingExchange ──status authorized──▶ Authorized
//!     ▲                                            │
//!     └──────────── any failure ───────────────────┘
//! ```
//!
//! The resulting [`Session`] is returned to the caller inside the [`User`];
//! nothing is kept here between calls.

use std::sync::Arc;

use forge::{
    ForgeError, LoginError, LoginRequest, LoginResponse, NodeApi, NodeApiError, NodeId, Session,
    SessionToken, Timestamp, User,
};
use tracing::{debug, info, instrument, warn};

/// Where a login attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing established yet.
    NoSession,
    /// The node is reachable and a candidate token was supplied.
    PendingExchange {
        /// Identity of the node.
        node_id: NodeId,
        /// Token to check.
        token: SessionToken,
    },
    /// The node confirmed the token.
    Authorized(Session),
}

/// Drives [`SessionState`] transitions for one login attempt at a time.
#[derive(Clone)]
pub struct SessionNegotiator {
    node: Arc<dyn NodeApi>,
    login_url: String,
}

impl SessionNegotiator {
    /// Creates a negotiator that hands out `login_url` with every response.
    pub fn new(node: Arc<dyn NodeApi>, login_url: String) -> Self {
        Self { node, login_url }
    }

    /// URL the user visits to obtain a session token.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Runs the login flow.
    ///
    /// Without a request, or without a code, no user is returned. The login
    /// URL is part of both the response and the error.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] wrapping [`ForgeError::Node`] if the node is
    /// unreachable, or [`ForgeError::Unauthorized`] if the token is not
    /// authorized.
    #[instrument(skip_all)]
    pub async fn login(&self, request: Option<&LoginRequest>) -> Result<LoginResponse, LoginError> {
        let Some(request) = request else {
            return Ok(self.response(None));
        };
        let code = request.code.as_deref().filter(|c| !c.is_empty());

        match self.establish(code).await {
            Ok(session) => {
                if let Some(session) = &session {
                    info!(login = %session.alias, node = %session.node_id, "Session authorized");
                }
                Ok(self.response(session.map(User::from_session)))
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(LoginError::new(self.login_url.clone(), e))
            }
        }
    }

    fn response(&self, user: Option<User>) -> LoginResponse {
        LoginResponse {
            user,
            login_url: self.login_url.clone(),
        }
    }

    /// Walks the state machine from [`SessionState::NoSession`].
    ///
    /// Returns `None` if no code was supplied.
    async fn establish(&self, code: Option<&str>) -> Result<Option<Session>, ForgeError> {
        let mut state = SessionState::NoSession;
        loop {
            state = match state {
                SessionState::NoSession => {
                    let node = self.node.node_info().await?;
                    let Some(code) = code else {
                        debug!("No session code supplied");
                        return Ok(None);
                    };
                    SessionState::PendingExchange {
                        node_id: node.config.id,
                        token: SessionToken::new(code),
                    }
                }
                SessionState::PendingExchange { node_id, token } => {
                    self.exchange(node_id, token).await?
                }
                SessionState::Authorized(session) => return Ok(Some(session)),
            };
        }
    }

    async fn exchange(
        &self,
        node_id: NodeId,
        token: SessionToken,
    ) -> Result<SessionState, ForgeError> {
        let info = match self.node.session_info(&token).await {
            Ok(info) => info,
            Err(NodeApiError::NotFound { .. }) => return Err(ForgeError::Unauthorized),
            Err(e) => return Err(e.into()),
        };

        if !info.status.is_authorized() {
            debug!(status = ?info.status, "Session not authorized");
            return Err(ForgeError::Unauthorized);
        }
        if info.is_expired_at(Timestamp::now()) {
            debug!("Session expired");
            return Err(ForgeError::Unauthorized);
        }

        let alias = if info.alias.is_empty() {
            node_id.to_string()
        } else {
            info.alias
        };
        Ok(SessionState::Authorized(Session {
            token,
            status: info.status,
            node_id,
            alias,
        }))
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
