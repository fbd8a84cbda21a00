//! Radicle node HTTP client.
//!
//! Implements the [`forge::NodeApi`] trait over a node's `radicle-httpd` REST
//! API (`/api/v1/...`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, authentication headers, status-code
//! mapping and JSON decoding live here. The [`forge`] crate sees only
//! [`forge::NodeApi`] and [`forge::NodeApiError`].
//!
//! ## Error mapping
//!
//! | Condition | [`forge::NodeApiError`] |
//! |-----------|-------------------------|
//! | connect/IO failure | `Transport` |
//! | client timeout elapsed | `Timeout` |
//! | `404 Not Found` | `NotFound` |
//! | other non-2xx | `Status` (body truncated) |
//! | body does not match the response type | `Decode` |

mod client;

pub use client::{ClientError, RadicleClient};
