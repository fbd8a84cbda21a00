//! Routing of authenticated deliveries by their declared event kind.

use forge::{CanonicalEvent, DispatchOutcome, EventKind, HookDelivery, HookError};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::payload::{PatchPayload, PushPayload};

/// Parses deliveries into canonical events.
///
/// Stateless; one instance serves every delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDispatcher;

impl EventDispatcher {
    /// Creates a dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Parses `delivery` according to its event-type label.
    ///
    /// Unknown or missing labels produce [`DispatchOutcome::Ignored`]; the body
    /// of an ignored delivery is never read.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Parse`] if the body does not match the schema of
    /// its declared kind, including required fields that are empty.
    pub fn dispatch(&self, delivery: &HookDelivery) -> Result<DispatchOutcome, HookError> {
        let kind = delivery.kind();
        let event = match &kind {
            EventKind::Push => {
                let payload: PushPayload = parse(&kind, &delivery.body)?;
                CanonicalEvent::Push(payload.into_event().map_err(|m| parse_error(&kind, m))?)
            }
            EventKind::Patch => {
                let payload: PatchPayload = parse(&kind, &delivery.body)?;
                CanonicalEvent::Patch(payload.into_event().map_err(|m| parse_error(&kind, m))?)
            }
            EventKind::Unknown(label) => {
                info!(event = %label, "Ignoring unsupported event type");
                return Ok(DispatchOutcome::Ignored {
                    event: label.clone(),
                });
            }
        };

        debug!(
            event = %kind,
            rid = %event.repository().id,
            commit = %event.head_commit(),
            "Parsed delivery"
        );
        Ok(DispatchOutcome::Event(event))
    }
}

fn parse<T: DeserializeOwned>(kind: &EventKind, body: &[u8]) -> Result<T, HookError> {
    serde_json::from_slice(body).map_err(|e| parse_error(kind, e.to_string()))
}

fn parse_error(kind: &EventKind, message: String) -> HookError {
    HookError::Parse {
        event: kind.label().to_string(),
        message,
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
