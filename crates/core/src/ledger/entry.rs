//! Ledger entry domain types.
//!
//! A ledger entry is an immutable fact: once written it is never mutated
//! or deleted. Every balance change is justified by exactly one entry
//! written in the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tixera_shared::types::{OrganizerId, TicketId, WithdrawalId};

use super::error::LedgerError;

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// A settled ticket sale crediting the organizer's pending funds.
    Sale,
    /// A refund debiting the organizer's funds.
    Refund,
    /// A payout movement out of available funds (or its reversal).
    Withdrawal,
    /// A provider-forced reversal of a settled sale.
    Chargeback,
}

impl EntryType {
    /// Returns the string representation of the entry type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Refund => "refund",
            Self::Withdrawal => "withdrawal",
            Self::Chargeback => "chargeback",
        }
    }

    /// Parses an entry type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sale" => Some(Self::Sale),
            "refund" => Some(Self::Refund),
            "withdrawal" => Some(Self::Withdrawal),
            "chargeback" => Some(Self::Chargeback),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deduplication key for an entry.
///
/// Precedence: the provider transaction reference when present, otherwise
/// the `(ticket, entry type)` pair. An append whose key matches an existing
/// entry is skipped, which makes webhook retries harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupKey {
    /// Provider transaction reference, unique per organizer.
    ExternalRef(String),
    /// One entry of a given type per ticket.
    TicketAction {
        /// The ticket the entry refers to.
        ticket_id: TicketId,
        /// The entry type.
        entry_type: EntryType,
    },
}

/// A ledger entry prior to persistence.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    /// The organizer whose balance this entry affects.
    pub organizer_id: OrganizerId,
    /// Whether this is a sale, refund, withdrawal, or chargeback.
    pub entry_type: EntryType,
    /// Credit amount (zero for debits).
    pub credit: Decimal,
    /// Debit amount (zero for credits).
    pub debit: Decimal,
    /// The ticket this entry refers to, if any.
    pub ticket_id: Option<TicketId>,
    /// The withdrawal this entry refers to, if any.
    pub withdrawal_id: Option<WithdrawalId>,
    /// The provider transaction reference, if any.
    pub external_ref: Option<String>,
    /// When the underlying event occurred.
    pub value_date: DateTime<Utc>,
}

impl NewLedgerEntry {
    /// A sale credit against the organizer's pending funds.
    #[must_use]
    pub fn sale(
        organizer_id: OrganizerId,
        net_amount: Decimal,
        ticket_id: TicketId,
        external_ref: String,
        value_date: DateTime<Utc>,
    ) -> Self {
        Self {
            organizer_id,
            entry_type: EntryType::Sale,
            credit: net_amount,
            debit: Decimal::ZERO,
            ticket_id: Some(ticket_id),
            withdrawal_id: None,
            external_ref: Some(external_ref),
            value_date,
        }
    }

    /// A refund debit against the organizer's funds.
    #[must_use]
    pub fn refund(
        organizer_id: OrganizerId,
        amount: Decimal,
        ticket_id: TicketId,
        value_date: DateTime<Utc>,
    ) -> Self {
        Self {
            organizer_id,
            entry_type: EntryType::Refund,
            credit: Decimal::ZERO,
            debit: amount,
            ticket_id: Some(ticket_id),
            withdrawal_id: None,
            external_ref: None,
            value_date,
        }
    }

    /// A chargeback debit keyed by the provider's dispute reference.
    #[must_use]
    pub fn chargeback(
        organizer_id: OrganizerId,
        amount: Decimal,
        ticket_id: TicketId,
        external_ref: String,
        value_date: DateTime<Utc>,
    ) -> Self {
        Self {
            organizer_id,
            entry_type: EntryType::Chargeback,
            credit: Decimal::ZERO,
            debit: amount,
            ticket_id: Some(ticket_id),
            withdrawal_id: None,
            external_ref: Some(external_ref),
            value_date,
        }
    }

    /// A withdrawal debit against the organizer's available funds.
    #[must_use]
    pub fn withdrawal(
        organizer_id: OrganizerId,
        amount: Decimal,
        withdrawal_id: WithdrawalId,
        transfer_ref: String,
        value_date: DateTime<Utc>,
    ) -> Self {
        Self {
            organizer_id,
            entry_type: EntryType::Withdrawal,
            credit: Decimal::ZERO,
            debit: amount,
            ticket_id: None,
            withdrawal_id: Some(withdrawal_id),
            external_ref: Some(transfer_ref),
            value_date,
        }
    }

    /// The compensating credit restoring funds after a failed transfer.
    #[must_use]
    pub fn withdrawal_reversal(
        organizer_id: OrganizerId,
        amount: Decimal,
        withdrawal_id: WithdrawalId,
        transfer_ref: &str,
        value_date: DateTime<Utc>,
    ) -> Self {
        Self {
            organizer_id,
            entry_type: EntryType::Withdrawal,
            credit: amount,
            debit: Decimal::ZERO,
            ticket_id: None,
            withdrawal_id: Some(withdrawal_id),
            external_ref: Some(format!("{transfer_ref}-reversal")),
            value_date,
        }
    }

    /// Validates that exactly one of credit/debit is set and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the entry does not move money in exactly
    /// one direction.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.credit < Decimal::ZERO || self.debit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if !self.credit.is_zero() && !self.debit.is_zero() {
            return Err(LedgerError::BothSidesSet);
        }
        if self.credit.is_zero() && self.debit.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        Ok(())
    }

    /// Returns the signed net amount (credit minus debit).
    #[must_use]
    pub fn net_amount(&self) -> Decimal {
        self.credit - self.debit
    }

    /// Returns the deduplication key for this entry.
    ///
    /// The provider reference wins when present; otherwise the
    /// `(ticket, entry type)` pair. Entries with neither (which the current
    /// constructors never produce) have no key and always append.
    #[must_use]
    pub fn dedup_key(&self) -> Option<DedupKey> {
        if let Some(external_ref) = &self.external_ref {
            return Some(DedupKey::ExternalRef(external_ref.clone()));
        }
        self.ticket_id.map(|ticket_id| DedupKey::TicketAction {
            ticket_id,
            entry_type: self.entry_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sale_entry() -> NewLedgerEntry {
        NewLedgerEntry::sale(
            OrganizerId::new(),
            dec!(9500),
            TicketId::new(),
            "PSK-12345".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_entry_type_round_trip() {
        for entry_type in [
            EntryType::Sale,
            EntryType::Refund,
            EntryType::Withdrawal,
            EntryType::Chargeback,
        ] {
            assert_eq!(EntryType::parse(entry_type.as_str()), Some(entry_type));
        }
        assert_eq!(EntryType::parse("SALE"), Some(EntryType::Sale));
        assert_eq!(EntryType::parse("invalid"), None);
    }

    #[test]
    fn test_sale_is_a_valid_credit() {
        let entry = sale_entry();
        assert!(entry.validate().is_ok());
        assert_eq!(entry.net_amount(), dec!(9500));
        assert_eq!(entry.debit, Decimal::ZERO);
    }

    #[test]
    fn test_refund_is_a_valid_debit() {
        let entry = NewLedgerEntry::refund(OrganizerId::new(), dec!(500), TicketId::new(), Utc::now());
        assert!(entry.validate().is_ok());
        assert_eq!(entry.net_amount(), dec!(-500));
        assert_eq!(entry.credit, Decimal::ZERO);
    }

    #[test]
    fn test_zero_entry_rejected() {
        let mut entry = sale_entry();
        entry.credit = Decimal::ZERO;
        assert!(matches!(entry.validate(), Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn test_negative_entry_rejected() {
        let mut entry = sale_entry();
        entry.credit = dec!(-1);
        assert!(matches!(entry.validate(), Err(LedgerError::NegativeAmount)));
    }

    #[test]
    fn test_both_sides_rejected() {
        let mut entry = sale_entry();
        entry.debit = dec!(1);
        assert!(matches!(entry.validate(), Err(LedgerError::BothSidesSet)));
    }

    #[test]
    fn test_dedup_key_prefers_external_ref() {
        let entry = sale_entry();
        assert_eq!(
            entry.dedup_key(),
            Some(DedupKey::ExternalRef("PSK-12345".to_string()))
        );
    }

    #[test]
    fn test_dedup_key_falls_back_to_ticket_action() {
        let ticket_id = TicketId::new();
        let entry = NewLedgerEntry::refund(OrganizerId::new(), dec!(500), ticket_id, Utc::now());
        assert_eq!(
            entry.dedup_key(),
            Some(DedupKey::TicketAction {
                ticket_id,
                entry_type: EntryType::Refund,
            })
        );
    }

    #[test]
    fn test_withdrawal_reversal_has_distinct_key() {
        let organizer_id = OrganizerId::new();
        let withdrawal_id = WithdrawalId::new();
        let debit = NewLedgerEntry::withdrawal(
            organizer_id,
            dec!(9000),
            withdrawal_id,
            "TRF-1".to_string(),
            Utc::now(),
        );
        let reversal = NewLedgerEntry::withdrawal_reversal(
            organizer_id,
            dec!(9000),
            withdrawal_id,
            "TRF-1",
            Utc::now(),
        );
        assert!(reversal.validate().is_ok());
        assert_ne!(debit.dedup_key(), reversal.dedup_key());
    }
}
