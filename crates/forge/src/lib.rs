//! Domain core of the Radicle forge adapter for Woodpecker CI.
//!
//! This crate contains every domain concept, newtype identifier, CI-side model
//! type and error type used throughout the adapter, plus the two port traits:
//! [`NodeApi`] (what the adapter needs from a Radicle node) and [`Forge`] (what
//! the CI server needs from the adapter). Infrastructure crates implement the
//! traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `PatchId`, `SessionToken`, etc.) |
//! | [`types`] | Value types (`PipelineStatus`, `SessionStatus`, `ListOptions`, `Timestamp`) |
//! | [`config`] | `ForgeConfig` and the login/details URL contracts |
//! | [`events`] | Deliveries, canonical events, dispatch outcomes, `HookError` |
//! | [`model`] | The CI server's view of users, repos, pipelines and content |
//! | [`node`] | The `NodeApi` port and the node's response types |
//! | [`interface`] | The `Forge` port |
//! | [`errors`] | `ForgeError`, `LoginError`, `RetryPolicy` |

pub mod config;
pub mod errors;
pub mod events;
pub mod identifiers;
pub mod interface;
pub mod model;
pub mod node;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{ConfigError, ForgeConfig};
pub use errors::{ForgeError, LoginError, RetryPolicy};
pub use events::{
    CanonicalEvent, DispatchOutcome, EventKind, HookDelivery, HookError, HookOutcome,
    HookRepository, PatchEvent, PushEvent,
};
pub use identifiers::{
    BranchName, CommitSha, DeliveryId, HookSecret, NodeId, PatchId, PipelineNumber, RepositoryId,
    RevisionId, SessionToken,
};
pub use interface::{Forge, LoginRequest, LoginResponse};
pub use model::{
    Commit, FileMeta, Netrc, Org, OrgPerm, Perm, Pipeline, PipelineTrigger, PullRequest, Repo,
    Session, Team, TriggerEvent, User, PATCH_ID_VARIABLE, REVISION_ID_VARIABLE,
};
pub use node::{NodeApi, NodeApiError};
pub use types::{
    ListOptions, PipelineStatus, SessionStatus, StatusAnnotation, StatusPhrasing, Timestamp,
};
