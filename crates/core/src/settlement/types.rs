//! Settlement input and outcome types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tixera_shared::types::TicketId;

/// A verified payment confirmation from the gateway.
///
/// Arrives either through a webhook or a polling verification call; the
/// settlement engine treats both identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// The internal payment reference the checkout flow created.
    pub reference: String,
    /// The provider's transaction identifier.
    pub external_ref: String,
    /// The amount the provider reports as paid.
    pub amount_paid: Decimal,
    /// When the provider recorded the payment.
    pub paid_at: DateTime<Utc>,
}

/// The result of feeding one confirmation through the settlement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The payment settled: ticket created, seat reserved, funds credited.
    Settled {
        /// The newly created ticket.
        ticket_id: TicketId,
        /// The organizer's net credit.
        net_credited: Decimal,
    },
    /// The confirmation was a no-op; duplicates are the normal case.
    Skipped(SkipReason),
}

/// Why a confirmation produced no state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No payment matches the reference. Never create money for an
    /// unknown payment; the confirmation is logged and discarded.
    UnknownReference,
    /// The payment already reached a terminal status. This is the primary
    /// idempotency boundary for webhook retries.
    AlreadyFinal,
    /// The ledger store rejected the entry as a duplicate.
    DuplicateLedgerEntry,
    /// The webhook event type does not settle payments.
    IgnoredEvent,
}

impl SettlementOutcome {
    /// Returns true if the confirmation actually settled.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_predicates() {
        let settled = SettlementOutcome::Settled {
            ticket_id: TicketId::new(),
            net_credited: dec!(9500),
        };
        assert!(settled.is_settled());
        assert!(!SettlementOutcome::Skipped(SkipReason::AlreadyFinal).is_settled());
    }
}
