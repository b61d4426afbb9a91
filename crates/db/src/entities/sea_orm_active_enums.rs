//! Postgres enum types used by the entities.
//!
//! Conversions to and from the `tixera-core` domain enums live here so
//! repositories never match on raw strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry type enum (`ledger_entry_type`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_entry_type")]
pub enum LedgerEntryType {
    /// A settled sale credit.
    #[sea_orm(string_value = "sale")]
    Sale,
    /// A refund debit.
    #[sea_orm(string_value = "refund")]
    Refund,
    /// A payout debit or its compensating credit.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// A provider-forced reversal debit.
    #[sea_orm(string_value = "chargeback")]
    Chargeback,
}

/// Payment status enum (`payment_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    /// Awaiting provider confirmation; the only retryable state.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled. Terminal.
    #[sea_orm(string_value = "success")]
    Success,
    /// Failed or mismatched. Terminal.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Ticket status enum (`ticket_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ticket_status")]
pub enum TicketStatus {
    /// Issued and redeemable.
    #[sea_orm(string_value = "active")]
    Active,
    /// Redeemed at the gate. Terminal.
    #[sea_orm(string_value = "checked_in")]
    CheckedIn,
    /// Refunded. Terminal.
    #[sea_orm(string_value = "refunded")]
    Refunded,
    /// Cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Withdrawal status enum (`withdrawal_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "withdrawal_status")]
pub enum WithdrawalStatus {
    /// OTP issued.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// OTP verified, transfer in flight.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Transfer confirmed. Terminal.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled or rejected. Terminal.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<tixera_core::ledger::EntryType> for LedgerEntryType {
    fn from(value: tixera_core::ledger::EntryType) -> Self {
        use tixera_core::ledger::EntryType;
        match value {
            EntryType::Sale => Self::Sale,
            EntryType::Refund => Self::Refund,
            EntryType::Withdrawal => Self::Withdrawal,
            EntryType::Chargeback => Self::Chargeback,
        }
    }
}

impl From<LedgerEntryType> for tixera_core::ledger::EntryType {
    fn from(value: LedgerEntryType) -> Self {
        match value {
            LedgerEntryType::Sale => Self::Sale,
            LedgerEntryType::Refund => Self::Refund,
            LedgerEntryType::Withdrawal => Self::Withdrawal,
            LedgerEntryType::Chargeback => Self::Chargeback,
        }
    }
}

impl From<tixera_core::ticket::TicketStatus> for TicketStatus {
    fn from(value: tixera_core::ticket::TicketStatus) -> Self {
        use tixera_core::ticket::TicketStatus as Core;
        match value {
            Core::Active => Self::Active,
            Core::CheckedIn => Self::CheckedIn,
            Core::Refunded => Self::Refunded,
            Core::Cancelled => Self::Cancelled,
        }
    }
}

impl From<TicketStatus> for tixera_core::ticket::TicketStatus {
    fn from(value: TicketStatus) -> Self {
        match value {
            TicketStatus::Active => Self::Active,
            TicketStatus::CheckedIn => Self::CheckedIn,
            TicketStatus::Refunded => Self::Refunded,
            TicketStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<tixera_core::withdrawal::WithdrawalStatus> for WithdrawalStatus {
    fn from(value: tixera_core::withdrawal::WithdrawalStatus) -> Self {
        use tixera_core::withdrawal::WithdrawalStatus as Core;
        match value {
            Core::Pending => Self::Pending,
            Core::Processing => Self::Processing,
            Core::Completed => Self::Completed,
            Core::Failed => Self::Failed,
        }
    }
}

impl From<WithdrawalStatus> for tixera_core::withdrawal::WithdrawalStatus {
    fn from(value: WithdrawalStatus) -> Self {
        match value {
            WithdrawalStatus::Pending => Self::Pending,
            WithdrawalStatus::Processing => Self::Processing,
            WithdrawalStatus::Completed => Self::Completed,
            WithdrawalStatus::Failed => Self::Failed,
        }
    }
}
