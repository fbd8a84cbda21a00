//! Delivery signature verification.
//!
//! Wire contract with the sending node:
//!
//! - digest: HMAC-SHA256 keyed with the UTF-8 bytes of the shared secret;
//! - input: the raw request body exactly as received, never re-serialized;
//! - encoding: `sha256=` followed by the lowercase hex digest;
//! - transport: the [`SIGNATURE_HEADER`] header.
//!
//! An empty secret disables verification.

use forge::{HookError, HookSecret};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Radicle-Signature";

/// Prefix naming the digest algorithm in the signature value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// How a delivery passed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The signature matched the body.
    Verified,
    /// No secret is configured, so nothing was checked.
    Skipped,
}

/// Computes and checks delivery signatures for one shared secret.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: HookSecret,
}

impl SignatureVerifier {
    /// Creates a verifier. An empty secret disables verification.
    pub fn new(secret: HookSecret) -> Self {
        Self { secret }
    }

    /// Returns `true` if deliveries are checked.
    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Computes the signature header value for `body`.
    ///
    /// Returns `None` when no secret is configured.
    pub fn sign(&self, body: &[u8]) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let mut mac = HmacSha256::new_from_slice(self.secret.expose().as_bytes()).ok()?;
        mac.update(body);
        let digest = mac.finalize().into_bytes();
        Some(format!("{SIGNATURE_PREFIX}{}", hex::encode(digest)))
    }

    /// Checks `signature` against `body`.
    ///
    /// The comparison is constant time over the full header value, so a
    /// signature that differs from the expected one in any byte, including
    /// hex letter case, is rejected.
    ///
    /// # Errors
    ///
    /// - [`HookError::MissingSignature`] if a secret is configured and no
    ///   signature was supplied.
    /// - [`HookError::InvalidSignature`] if the signature does not match.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<Verification, HookError> {
        if !self.is_enabled() {
            warn!("Webhook secret not configured; accepting delivery without verification");
            return Ok(Verification::Skipped);
        }
        let Some(signature) = signature else {
            return Err(HookError::MissingSignature);
        };
        let Some(expected) = self.sign(body) else {
            return Err(HookError::InvalidSignature);
        };

        if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            Ok(Verification::Verified)
        } else {
            Err(HookError::InvalidSignature)
        }
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
