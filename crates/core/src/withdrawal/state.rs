//! Withdrawal state machine and request validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::WithdrawalError;
use crate::maturity;

/// Withdrawal status in the payout workflow.
///
/// The valid transitions are:
/// - Pending → Processing (OTP verified)
/// - Pending → Failed (OTP expired or attempts exhausted)
/// - Processing → Completed (transfer confirmed)
/// - Processing → Failed (transfer rejected, balance restored)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    /// OTP issued, waiting for verification.
    Pending,
    /// OTP verified, transfer in flight.
    Processing,
    /// Transfer confirmed and funds moved to withdrawn.
    Completed,
    /// Cancelled or transfer rejected; no funds left the account.
    Failed,
}

impl WithdrawalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true while the withdrawal still occupies the organizer's
    /// single in-flight slot.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Returns true once the withdrawal can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a transition to `next` is legal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination bank account for a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    /// Account number at the destination bank.
    pub account_number: String,
    /// Bank routing code.
    pub bank_code: String,
    /// Account holder name.
    pub account_name: String,
}

impl BankDetails {
    /// Validates that all fields are present.
    ///
    /// # Errors
    ///
    /// Returns `BankDetailsMissing` if any field is empty.
    pub fn validate(&self) -> Result<(), WithdrawalError> {
        if self.account_number.trim().is_empty()
            || self.bank_code.trim().is_empty()
            || self.account_name.trim().is_empty()
        {
            return Err(WithdrawalError::BankDetailsMissing);
        }
        Ok(())
    }
}

/// Policy limits for withdrawal requests.
#[derive(Debug, Clone, Copy)]
pub struct WithdrawalPolicy {
    /// Minimum withdrawable amount.
    pub minimum_amount: Decimal,
    /// How long an OTP stays valid.
    pub otp_ttl: chrono::Duration,
    /// Wrong codes allowed before the request is cancelled.
    pub max_otp_attempts: i32,
}

impl WithdrawalPolicy {
    /// Validates a withdrawal request against the policy and the
    /// organizer's current state.
    ///
    /// `available` must come from a row read under lock in the same
    /// transaction that creates the request; a stale read here is exactly
    /// the race this workflow exists to prevent.
    ///
    /// # Errors
    ///
    /// Returns the first rule the request violates.
    pub fn validate_request(
        &self,
        amount: Decimal,
        available: Decimal,
        has_active_withdrawal: bool,
        first_paid_sale: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), WithdrawalError> {
        if amount < self.minimum_amount {
            return Err(WithdrawalError::BelowMinimum {
                minimum: self.minimum_amount,
            });
        }
        if !maturity::clock_started(first_paid_sale, now) {
            return Err(WithdrawalError::FundsNotMatured);
        }
        if amount > available {
            return Err(WithdrawalError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        if has_active_withdrawal {
            return Err(WithdrawalError::WithdrawalInFlight);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn policy() -> WithdrawalPolicy {
        WithdrawalPolicy {
            minimum_amount: dec!(1000),
            otp_ttl: Duration::minutes(10),
            max_otp_attempts: 5,
        }
    }

    fn matured_sale() -> Option<DateTime<Utc>> {
        Some(Utc::now() - Duration::hours(25))
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            WithdrawalStatus::Pending,
            WithdrawalStatus::Processing,
            WithdrawalStatus::Completed,
            WithdrawalStatus::Failed,
        ] {
            assert_eq!(WithdrawalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WithdrawalStatus::parse("bogus"), None);
    }

    #[test]
    fn test_active_statuses() {
        assert!(WithdrawalStatus::Pending.is_active());
        assert!(WithdrawalStatus::Processing.is_active());
        assert!(!WithdrawalStatus::Completed.is_active());
        assert!(!WithdrawalStatus::Failed.is_active());
    }

    #[test]
    fn test_legal_transitions() {
        use WithdrawalStatus::{Completed, Failed, Pending, Processing};

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
    }

    #[test]
    fn test_bank_details_validation() {
        let details = BankDetails {
            account_number: "0123456789".into(),
            bank_code: "058".into(),
            account_name: "Ada Obi".into(),
        };
        assert!(details.validate().is_ok());

        let missing = BankDetails {
            account_number: "  ".into(),
            ..details
        };
        assert!(matches!(
            missing.validate(),
            Err(WithdrawalError::BankDetailsMissing)
        ));
    }

    #[test]
    fn test_request_below_minimum() {
        let result = policy().validate_request(dec!(999), dec!(5000), false, matured_sale(), Utc::now());
        assert!(matches!(result, Err(WithdrawalError::BelowMinimum { .. })));
    }

    #[test]
    fn test_request_before_maturity() {
        let recent = Some(Utc::now() - Duration::hours(1));
        let result = policy().validate_request(dec!(2000), dec!(5000), false, recent, Utc::now());
        assert!(matches!(result, Err(WithdrawalError::FundsNotMatured)));

        let never_sold = policy().validate_request(dec!(2000), dec!(5000), false, None, Utc::now());
        assert!(matches!(never_sold, Err(WithdrawalError::FundsNotMatured)));
    }

    #[test]
    fn test_request_insufficient_funds() {
        let result = policy().validate_request(dec!(6000), dec!(5000), false, matured_sale(), Utc::now());
        assert!(matches!(
            result,
            Err(WithdrawalError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_request_single_flight() {
        let result = policy().validate_request(dec!(2000), dec!(5000), true, matured_sale(), Utc::now());
        assert!(matches!(result, Err(WithdrawalError::WithdrawalInFlight)));
    }

    #[test]
    fn test_valid_request() {
        let result = policy().validate_request(dec!(2000), dec!(5000), false, matured_sale(), Utc::now());
        assert!(result.is_ok());
    }
}
