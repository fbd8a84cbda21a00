//! Newtype domain identifiers.
//!
//! Every concept that has an identity on the Radicle node or the CI server is
//! a distinct newtype wrapping a primitive. This prevents accidentally
//! interchanging, for example, a [`PatchId`] with a [`RevisionId`] even though
//! both are object-id strings under the hood.
//!
//! Credentials ([`SessionToken`], [`HookSecret`]) are newtypes too, with a
//! redacted `Debug` so they never end up in logs through `{:?}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for credential newtypes.
// Same shape as `string_id!` but `Debug` never prints the value and there is
// no `Display`; callers must ask for the raw value explicitly.
// ---------------------------------------------------------------------------
macro_rules! secret_string {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw credential value. Empty values are allowed.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the raw credential value.
            pub fn expose(&self) -> &str {
                &self.0
            }

            /// Returns `true` if no credential value is present.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if self.0.is_empty() {
                    write!(f, "{}(<empty>)", stringify!($name))
                } else {
                    write!(f, "{}(<redacted>)", stringify!($name))
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: CI-server-assigned integers
// ---------------------------------------------------------------------------

/// The CI server's sequential pipeline number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineNumber(u64);

impl PipelineNumber {
    /// Creates a new pipeline number from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PipelineNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one inbound webhook delivery.
///
/// Generated fresh when a delivery is received; recorded on the tracing span
/// so verification, dispatch and the hand-off to the pipeline engine can be
/// correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    /// Generates a new random delivery identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (Radicle object ids and names)
// ---------------------------------------------------------------------------

string_id! {
    /// A Radicle repository identifier (RID), e.g. `"rad:z3gqcJUoA1n9HaHKufZs5FCSGazv5"`.
    ///
    /// Used as the CI server's forge remote id for a repository.
    RepositoryId
}

string_id! {
    /// The public identity of a Radicle node or user (`did:key:…` or bare key).
    NodeId
}

impl NodeId {
    const DID_KEY_PREFIX: &'static str = "did:key:";

    /// Returns the key with any `did:key:` prefix removed.
    pub fn key(&self) -> &str {
        self.0.strip_prefix(Self::DID_KEY_PREFIX).unwrap_or(&self.0)
    }

    /// Returns `true` if both identify the same key, regardless of whether
    /// either is written as a DID.
    pub fn same_key(&self, other: &NodeId) -> bool {
        self.key() == other.key()
    }
}

string_id! {
    /// A Git branch name (e.g. `"main"`).
    BranchName
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

string_id! {
    /// Identifies a Radicle patch (the object id of its root COB entry).
    PatchId
}

string_id! {
    /// Identifies one revision of a Radicle patch.
    RevisionId
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

secret_string! {
    /// Opaque session token issued by the node's own authorization UI.
    ///
    /// The node's session-info endpoint is the only authority on whether a
    /// token is authorized; this type carries no validity guarantee.
    SessionToken
}

secret_string! {
    /// Shared secret used to sign webhook deliveries.
    ///
    /// An empty secret disables signature verification.
    HookSecret
}
