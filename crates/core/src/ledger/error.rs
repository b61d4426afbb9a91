//! Ledger error types for validation and balance errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Entry must move money in exactly one direction.
    #[error("Entry amount cannot be zero")]
    ZeroAmount,

    /// Entry amounts cannot be negative.
    #[error("Entry amount cannot be negative")]
    NegativeAmount,

    /// Entry must be either a credit or a debit, not both.
    #[error("Entry must specify either credit or debit, not both")]
    BothSidesSet,

    /// An entry with the same deduplication key already exists.
    ///
    /// This is an idempotent no-op for callers: the original entry already
    /// accounted for the event.
    #[error("Duplicate ledger entry: {0}")]
    Duplicate(String),

    /// A debit would exceed the funds in the targeted bucket.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// The amount the caller attempted to debit.
        requested: Decimal,
        /// The funds actually present at the time of the attempt.
        available: Decimal,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for admin tooling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::BothSidesSet => "BOTH_SIDES_SET",
            Self::Duplicate(_) => "DUPLICATE_ENTRY",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if this error is a deduplication skip rather than a failure.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}
