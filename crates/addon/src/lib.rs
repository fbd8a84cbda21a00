//! Radicle forge for Woodpecker CI.
//!
//! [`RadicleForge`] implements [`forge::Forge`] on top of any
//! [`forge::NodeApi`]. It sequences calls between the domain rules in the
//! [`forge`] crate, the delivery handling in [`listener`] and the node:
//!
//! | Component | Responsibility |
//! |-----------|----------------|
//! | [`SessionNegotiator`] | Login: node reachability, session token check |
//! | [`WebhookLifecycle`] | Reconciles or removes the repository's webhook |
//! | [`StatusReporter`] | Comments pipeline results on patch revisions |
//! | [`RadicleForge`] | Repository reads, delivery conversion, the rest of `Forge` |
//!
//! ## Architectural Layer
//!
//! **Orchestration.** No HTTP details and no domain rules of its own.

mod adapter;
mod convert;
mod session;
mod status;
mod webhooks;

#[cfg(test)]
mod testing;

pub use adapter::{RadicleForge, FORGE_NAME};
pub use session::{SessionNegotiator, SessionState};
pub use status::{render_comment, Report, StatusReporter};
pub use webhooks::{Reconciliation, WebhookLifecycle};
