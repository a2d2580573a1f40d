//! Keyed-hash integrity checking for inbound metric updates.
//!
//! Each update may carry a hex-encoded HMAC-SHA256 of
//! `{name}:{kind}:{value-or-delta}` computed with a shared secret key.
//!
//! The policy is fail-open by design and this is a known weak point: when
//! the configured key is empty, or the update carries no hash, verification
//! is skipped and the update passes. Agent and server must both be
//! configured with the same key for the gate to bind; mismatched
//! configuration silently disables the check rather than failing closed.

use crate::core::{MetricKind, MetricUpdate, MetrondError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the keyed hash attached to metric updates.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: String,
}

impl SignatureVerifier {
    /// Create a verifier with the given shared secret. An empty key
    /// disables verification.
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self { key: key.into() }
    }

    /// True when a key is configured.
    pub fn is_enabled(&self) -> bool {
        !self.key.is_empty()
    }

    /// Compute the hex-encoded signature for an update. Used by agents
    /// and tests; the server side only recomputes for comparison.
    pub fn sign(&self, update: &MetricUpdate) -> Result<String> {
        let payload = signing_payload(update)?;
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| MetrondError::integrity(format!("invalid signing key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check the update's hash against the recomputed signature.
    ///
    /// Passes when verification is disabled or the update carries no hash.
    /// A present-but-wrong hash is an integrity error and the update must
    /// not reach the store.
    pub fn verify(&self, update: &MetricUpdate) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let Some(hash) = &update.hash else {
            return Ok(());
        };

        let supplied = hex::decode(hash)
            .map_err(|_| MetrondError::integrity(update.id.clone()))?;

        let payload = signing_payload(update)?;
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| MetrondError::integrity(format!("invalid signing key: {}", e)))?;
        mac.update(payload.as_bytes());

        // Constant-time comparison via the Mac trait.
        mac.verify_slice(&supplied)
            .map_err(|_| MetrondError::integrity(update.id.clone()))
    }
}

/// Deterministic byte string the signature covers.
fn signing_payload(update: &MetricUpdate) -> Result<String> {
    match update.validate()? {
        MetricKind::Gauge => {
            // validate() guarantees the value is present
            let value = update.value.unwrap_or_default();
            Ok(format!("{}:gauge:{}", update.id, value))
        },
        MetricKind::Counter => {
            let delta = update.delta.unwrap_or_default();
            Ok(format!("{}:counter:{}", update.id, delta))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_verifier_passes_everything() {
        let verifier = SignatureVerifier::new("");
        assert!(!verifier.is_enabled());

        let update = MetricUpdate::gauge("Alloc", 100.5).with_hash("bogus");
        assert!(verifier.verify(&update).is_ok());
    }

    #[test]
    fn test_missing_hash_passes() {
        let verifier = SignatureVerifier::new("k1");
        let update = MetricUpdate::gauge("Alloc", 100.5);
        assert!(verifier.verify(&update).is_ok());
    }

    #[test]
    fn test_valid_signature_accepted() {
        let verifier = SignatureVerifier::new("k1");
        let update = MetricUpdate::gauge("Alloc", 100.5);
        let hash = verifier.sign(&update).unwrap();
        let signed = update.with_hash(hash);
        assert!(verifier.verify(&signed).is_ok());
    }

    #[test]
    fn test_bogus_signature_rejected() {
        let verifier = SignatureVerifier::new("k1");
        let update = MetricUpdate::gauge("Alloc", 100.5).with_hash("bogus");
        assert!(matches!(verifier.verify(&update), Err(MetrondError::Integrity(_))));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = SignatureVerifier::new("k1");
        let verifier = SignatureVerifier::new("k2");
        let update = MetricUpdate::counter("PollCount", 42);
        let hash = signer.sign(&update).unwrap();
        let signed = update.with_hash(hash);
        assert!(verifier.verify(&signed).is_err());
    }

    #[test]
    fn test_signature_covers_value() {
        let verifier = SignatureVerifier::new("k1");
        let hash = verifier.sign(&MetricUpdate::gauge("Alloc", 100.5)).unwrap();
        // Same name, different value: signature must not match.
        let tampered = MetricUpdate::gauge("Alloc", 200.5).with_hash(hash);
        assert!(verifier.verify(&tampered).is_err());
    }

    #[test]
    fn test_counter_and_gauge_payloads_differ() {
        let verifier = SignatureVerifier::new("k1");
        let gauge_hash = verifier.sign(&MetricUpdate::gauge("X", 1.0)).unwrap();
        let counter_hash = verifier.sign(&MetricUpdate::counter("X", 1)).unwrap();
        assert_ne!(gauge_hash, counter_hash);
    }
}
