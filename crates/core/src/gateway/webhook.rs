//! Webhook payload verification.
//!
//! Every webhook carries an HMAC-SHA512 signature of its raw body,
//! computed with the shared secret. Verification is a hard precondition:
//! unsigned or mismatched payloads are rejected before the body is even
//! parsed. `Mac::verify_slice` compares in constant time.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// Errors from webhook signature verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// The signature header is not valid hex.
    #[error("Malformed webhook signature")]
    MalformedSignature,

    /// The signature does not match the payload.
    #[error("Webhook signature mismatch")]
    SignatureMismatch,
}

/// Computes the hex signature for a payload.
///
/// Used by tests and by gateway client implementations that need to sign
/// callbacks.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a payload against its hex signature.
///
/// # Errors
///
/// Returns `WebhookError` when the signature is malformed or does not
/// match the payload.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), WebhookError> {
    let expected = hex::decode(signature).map_err(|_| WebhookError::MalformedSignature)?;

    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::SignatureMismatch)
}

/// A charge-success webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `charge.success`.
    pub event: String,
    /// Our payment reference.
    pub reference: String,
    /// The provider's transaction identifier.
    pub external_ref: String,
    /// Amount the provider collected.
    pub amount: Decimal,
    /// When the provider recorded the charge.
    pub paid_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Event name for successful charges.
    pub const CHARGE_SUCCESS: &'static str = "charge.success";

    /// Returns true if this event settles a payment.
    #[must_use]
    pub fn is_charge_success(&self) -> bool {
        self.event == Self::CHARGE_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn test_sign_verify_round_trip() {
        let body = br#"{"event":"charge.success","reference":"PAY-1"}"#;
        let signature = sign(SECRET, body);
        assert!(verify_signature(SECRET, body, &signature).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = br#"{"amount":"100.00"}"#;
        let signature = sign(SECRET, body);
        let tampered = br#"{"amount":"999.00"}"#;
        assert_eq!(
            verify_signature(SECRET, tampered, &signature),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"payload";
        let signature = sign(SECRET, body);
        assert_eq!(
            verify_signature("other-secret", body, &signature),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert_eq!(
            verify_signature(SECRET, b"payload", "zz-not-hex"),
            Err(WebhookError::MalformedSignature)
        );
        assert_eq!(
            verify_signature(SECRET, b"payload", ""),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn test_charge_success_predicate() {
        let event = WebhookEvent {
            event: "charge.success".into(),
            reference: "PAY-1".into(),
            external_ref: "PSK-1".into(),
            amount: Decimal::new(10_000, 0),
            paid_at: Utc::now(),
        };
        assert!(event.is_charge_success());

        let other = WebhookEvent {
            event: "transfer.success".into(),
            ..event
        };
        assert!(!other.is_charge_success());
    }
}
