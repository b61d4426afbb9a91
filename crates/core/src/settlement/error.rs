//! Settlement error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tixera_shared::types::TierId;

/// Errors that can occur while settling a payment confirmation.
///
/// Duplicate deliveries are not errors; they surface as skipped outcomes.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The paid amount differs from the recomputed expectation by more
    /// than one smallest currency unit. The payment is marked FAILED.
    #[error("Amount mismatch for payment {reference}: expected {expected}, paid {paid}")]
    AmountMismatch {
        /// The internal payment reference.
        reference: String,
        /// The recomputed expected charge.
        expected: Decimal,
        /// The amount the provider reported as paid.
        paid: Decimal,
    },

    /// The tier had no seats left. The settlement transaction is rolled
    /// back and the payment stays PENDING for manual reconciliation.
    #[error("Tier {0} is sold out")]
    InventorySoldOut(TierId),

    /// The payment references a tier that no longer exists.
    #[error("Tier not found: {0}")]
    TierNotFound(TierId),

    /// The webhook failed signature verification and was discarded.
    #[error("Webhook rejected: {0}")]
    WebhookRejected(#[from] crate::gateway::webhook::WebhookError),

    /// The webhook body could not be parsed after its signature verified.
    #[error("Malformed webhook payload: {0}")]
    MalformedWebhook(String),

    /// The payment gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the error code for admin tooling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::InventorySoldOut(_) => "INVENTORY_SOLD_OUT",
            Self::TierNotFound(_) => "TIER_NOT_FOUND",
            Self::WebhookRejected(_) => "WEBHOOK_REJECTED",
            Self::MalformedWebhook(_) => "MALFORMED_WEBHOOK",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true when the condition needs a human to look at it.
    ///
    /// A sold-out settlement means money was received for a seat that does
    /// not exist; it must never be silently dropped.
    #[must_use]
    pub const fn needs_review(&self) -> bool {
        matches!(self, Self::InventorySoldOut(_) | Self::AmountMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        let err = SettlementError::AmountMismatch {
            reference: "PAY-1".into(),
            expected: dec!(100),
            paid: dec!(90),
        };
        assert_eq!(err.error_code(), "AMOUNT_MISMATCH");
        assert_eq!(
            SettlementError::InventorySoldOut(TierId::new()).error_code(),
            "INVENTORY_SOLD_OUT"
        );
    }

    #[test]
    fn test_review_flags() {
        assert!(SettlementError::InventorySoldOut(TierId::new()).needs_review());
        assert!(!SettlementError::Database("x".into()).needs_review());
    }
}
