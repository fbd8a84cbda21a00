//! Radicle webhook receiver.
//!
//! Turns inbound HTTP requests from a Radicle node into canonical events:
//!
//! - [`SignatureVerifier`] checks the HMAC-SHA256 signature of every delivery
//!   against the shared secret before anything reads the body.
//! - [`EventDispatcher`] routes an authenticated delivery by its declared event
//!   kind and parses the push or patch payload.
//! - [`HookReceiver`] composes the two.
//! - [`server`] is the `axum` surface: `POST /hook`, `GET /login` and
//!   `GET /healthz`, plus the [`PipelineSink`] port accepted triggers go to.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Header names, signature framing and payload schemas
//! live here. The [`forge`] crate sees only [`forge::HookDelivery`],
//! [`forge::DispatchOutcome`] and [`forge::HookError`].

mod dispatch;
mod payload;
mod receiver;
pub mod server;
mod signature;

pub use dispatch::EventDispatcher;
pub use receiver::HookReceiver;
pub use server::{
    build_router, run_server, ApiError, AppState, PipelineSink, SinkError, EVENT_TYPE_HEADER,
};
pub use signature::{SignatureVerifier, Verification, SIGNATURE_HEADER, SIGNATURE_PREFIX};
