//! Delivery intake: signature verification followed by event dispatch.

use forge::{DispatchOutcome, HookDelivery, HookError, HookSecret};
use tracing::{info_span, warn};

use crate::dispatch::EventDispatcher;
use crate::signature::SignatureVerifier;

/// Authenticates and parses inbound deliveries.
///
/// Verification always runs before the body is parsed, so an unauthenticated
/// body never reaches the JSON decoder.
#[derive(Debug, Clone)]
pub struct HookReceiver {
    verifier: SignatureVerifier,
    dispatcher: EventDispatcher,
}

impl HookReceiver {
    /// Creates a receiver checking deliveries against `secret`.
    pub fn new(secret: HookSecret) -> Self {
        Self {
            verifier: SignatureVerifier::new(secret),
            dispatcher: EventDispatcher::new(),
        }
    }

    /// Returns the signature verifier.
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    /// Verifies and dispatches one delivery.
    ///
    /// # Errors
    ///
    /// Returns the [`HookError`] of whichever stage rejected the delivery.
    pub fn receive(&self, delivery: &HookDelivery) -> Result<DispatchOutcome, HookError> {
        let span = info_span!(
            "hook_delivery",
            delivery_id = %delivery.id,
            event = delivery.event_type.as_deref().unwrap_or_default(),
        );
        let _guard = span.enter();

        self.verifier
            .verify(&delivery.body, delivery.signature.as_deref())
            .inspect_err(|e| warn!(error = %e, "Rejected delivery"))?;
        self.dispatcher
            .dispatch(delivery)
            .inspect_err(|e| warn!(error = %e, "Rejected delivery"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_signature_is_rejected_before_parsing() {
        let receiver = HookReceiver::new(HookSecret::new("s3cret"));
        let delivery = HookDelivery::new(
            Some("push".into()),
            Some("sha256=00".into()),
            b"{not json".to_vec(),
        );
        assert_eq!(
            receiver.receive(&delivery).unwrap_err(),
            HookError::InvalidSignature
        );
    }

    #[test]
    fn test_signed_unknown_event_is_ignored() {
        let receiver = HookReceiver::new(HookSecret::new("s3cret"));
        let body = b"{}".to_vec();
        let signature = receiver.verifier().sign(&body);
        let delivery = HookDelivery::new(Some("star".into()), signature, body);
        assert_eq!(
            receiver.receive(&delivery).unwrap(),
            DispatchOutcome::Ignored {
                event: "star".into()
            }
        );
    }

    #[test]
    fn test_signed_malformed_body_is_a_parse_error() {
        let receiver = HookReceiver::new(HookSecret::new("s3cret"));
        let body = b"[]".to_vec();
        let signature = receiver.verifier().sign(&body);
        let delivery = HookDelivery::new(Some("push".into()), signature, body);
        assert!(matches!(
            receiver.receive(&delivery),
            Err(HookError::Parse { .. })
        ));
    }
}
