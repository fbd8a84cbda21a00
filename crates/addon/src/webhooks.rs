//! Webhook registration on the node.
//!
//! Activation reconciles: after it succeeds, exactly one registration with
//! the current secret delivers to the callback URL.

use std::sync::Arc;

use forge::node::{RepoWebhook, WEBHOOK_CONTENT_TYPE};
use forge::{ForgeError, HookSecret, NodeApi, NodeApiError, RepositoryId, SessionToken};
use tracing::{debug, info, instrument};

/// What [`WebhookLifecycle::activate`] changed on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// A matching registration already existed.
    Unchanged,
    /// No registration existed; one was created.
    Created,
    /// Stale or duplicate registrations were replaced by a single one.
    Replaced,
}

/// Keeps a repository's webhook registration in line with the adapter's
/// callback URL and secret.
#[derive(Clone)]
pub struct WebhookLifecycle {
    node: Arc<dyn NodeApi>,
    secret: HookSecret,
}

impl WebhookLifecycle {
    /// Creates a lifecycle manager registering hooks signed with `secret`.
    pub fn new(node: Arc<dyn NodeApi>, secret: HookSecret) -> Self {
        Self { node, secret }
    }

    fn desired(&self, rid: &RepositoryId, link: &str) -> RepoWebhook {
        RepoWebhook {
            repo_id: rid.clone(),
            url: link.to_string(),
            secret: self.secret.clone(),
            content_type: WEBHOOK_CONTENT_TYPE.to_string(),
        }
    }

    /// Ensures exactly one registration delivers to `link` with the current
    /// secret. Idempotent.
    ///
    /// The node has no update call, so a stale registration is removed and
    /// created again.
    ///
    /// # Errors
    ///
    /// - [`ForgeError::RepositoryLookup`] if the repository cannot be fetched.
    /// - [`ForgeError::Activation`] if listing, removing or creating fails.
    #[instrument(skip(self, token), fields(rid = %rid))]
    pub async fn activate(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        link: &str,
    ) -> Result<Reconciliation, ForgeError> {
        self.node
            .project(token, rid)
            .await
            .map_err(ForgeError::RepositoryLookup)?;

        let desired = self.desired(rid, link);
        let existing: Vec<RepoWebhook> = self
            .node
            .webhooks(token, rid)
            .await
            .map_err(ForgeError::Activation)?
            .into_iter()
            .filter(|h| h.url == link)
            .collect();

        let outcome = match existing.as_slice() {
            [hook] if hook.matches(&desired) => Reconciliation::Unchanged,
            [] => {
                self.node
                    .add_webhook(token, &desired)
                    .await
                    .map_err(ForgeError::Activation)?;
                Reconciliation::Created
            }
            stale => {
                debug!(count = stale.len(), "Replacing registrations for callback");
                // Removal is by URL and drops every duplicate at once.
                self.node
                    .remove_webhook(token, rid, link)
                    .await
                    .map_err(ForgeError::Activation)?;
                self.node
                    .add_webhook(token, &desired)
                    .await
                    .map_err(ForgeError::Activation)?;
                Reconciliation::Replaced
            }
        };

        info!(?outcome, "Webhook reconciled");
        Ok(outcome)
    }

    /// Removes the registration delivering to `link`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Deactivation`] if listing or removal fails.
    #[instrument(skip(self, token), fields(rid = %rid))]
    pub async fn deactivate(
        &self,
        token: &SessionToken,
        rid: &RepositoryId,
        link: &str,
    ) -> Result<(), ForgeError> {
        let hooks = match self.node.webhooks(token, rid).await {
            Ok(hooks) => hooks,
            Err(NodeApiError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(ForgeError::Deactivation(e)),
        };

        if !hooks.iter().any(|h| h.url == link) {
            debug!("No webhook registered for callback; nothing to remove");
            return Ok(());
        }

        self.node
            .remove_webhook(token, rid, link)
            .await
            .map_err(ForgeError::Deactivation)?;
        info!("Webhook removed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "webhooks_tests.rs"]
mod tests;
