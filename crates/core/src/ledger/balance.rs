//! Balance bucket arithmetic.
//!
//! An organizer's funds live in three buckets of increasing liquidity:
//! `pending` (settled, inside the 24h maturity window), `available`
//! (withdrawable), and `withdrawn` (paid out). All bucket movements are
//! computed here and applied by the storage layer inside the same
//! transaction as the ledger entry that justifies them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// A point-in-time view of an organizer's balance buckets.
///
/// All operations return a new snapshot; the caller persists it atomically
/// with the justifying ledger entry. Buckets never go negative: any
/// operation that would overdraw fails with `InsufficientFunds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Settled funds still inside the maturity window.
    pub pending: Decimal,
    /// Matured funds eligible for withdrawal.
    pub available: Decimal,
    /// Funds already paid out.
    pub withdrawn: Decimal,
}

impl BalanceSnapshot {
    /// An empty balance, the state of a lazily-created account.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            pending: Decimal::ZERO,
            available: Decimal::ZERO,
            withdrawn: Decimal::ZERO,
        }
    }

    /// Creates a snapshot from raw bucket values.
    #[must_use]
    pub const fn new(pending: Decimal, available: Decimal, withdrawn: Decimal) -> Self {
        Self {
            pending,
            available,
            withdrawn,
        }
    }

    /// Funds not yet paid out (pending + available).
    #[must_use]
    pub fn held(&self) -> Decimal {
        self.pending + self.available
    }

    /// Funds already moved out of pending (available + withdrawn).
    ///
    /// The maturity sweep subtracts this from matured sales to decide how
    /// much more may be released.
    #[must_use]
    pub fn released(&self) -> Decimal {
        self.available + self.withdrawn
    }

    /// Credits a settled sale into `pending`.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` for negative credits.
    pub fn credit_pending(&self, amount: Decimal) -> Result<Self, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        Ok(Self {
            pending: self.pending + amount,
            ..*self
        })
    }

    /// Debits `available`, failing if the bucket cannot cover the amount.
    ///
    /// The check happens against this snapshot, which the storage layer
    /// reads under a row lock in the same transaction as the write.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` when `amount` exceeds `available`.
    pub fn debit_available(&self, amount: Decimal) -> Result<Self, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if amount > self.available {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.available,
            });
        }
        Ok(Self {
            available: self.available - amount,
            ..*self
        })
    }

    /// Applies a refund or chargeback debit, draining `pending` before
    /// touching `available`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` when the two buckets together cannot
    /// cover the amount.
    pub fn apply_compensating_debit(&self, amount: Decimal) -> Result<Self, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if amount > self.held() {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.held(),
            });
        }
        let from_pending = amount.min(self.pending);
        let from_available = amount - from_pending;
        Ok(Self {
            pending: self.pending - from_pending,
            available: self.available - from_available,
            withdrawn: self.withdrawn,
        })
    }

    /// Moves matured funds from `pending` to `available`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` when `amount` exceeds `pending`; the
    /// maturity sweep clamps before calling, so this indicates a bug.
    pub fn release(&self, amount: Decimal) -> Result<Self, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if amount > self.pending {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.pending,
            });
        }
        Ok(Self {
            pending: self.pending - amount,
            available: self.available + amount,
            withdrawn: self.withdrawn,
        })
    }

    /// Records the completion of a withdrawal whose debit already happened.
    #[must_use]
    pub fn complete_withdrawal(&self, amount: Decimal) -> Self {
        Self {
            withdrawn: self.withdrawn + amount,
            ..*self
        }
    }

    /// Restores `available` after a transfer failed post-debit.
    #[must_use]
    pub fn restore_available(&self, amount: Decimal) -> Self {
        Self {
            available: self.available + amount,
            ..*self
        }
    }

    /// Returns true if no bucket is negative.
    #[must_use]
    pub fn is_non_negative(&self) -> bool {
        self.pending >= Decimal::ZERO
            && self.available >= Decimal::ZERO
            && self.withdrawn >= Decimal::ZERO
    }
}
