//! Withdrawal error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tixera_shared::types::WithdrawalId;

/// Errors that can occur in the withdrawal workflow.
#[derive(Debug, Error)]
pub enum WithdrawalError {
    /// The organizer has no bank details on file.
    #[error("Bank details are missing or incomplete")]
    BankDetailsMissing,

    /// The requested amount is below the configured minimum.
    #[error("Amount is below the minimum withdrawal of {minimum}")]
    BelowMinimum {
        /// The configured minimum.
        minimum: Decimal,
    },

    /// The requested amount exceeds the available balance.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// The requested amount.
        requested: Decimal,
        /// The available balance at the time of the attempt.
        available: Decimal,
    },

    /// Another withdrawal is already pending or processing.
    #[error("A withdrawal is already in flight for this organizer")]
    WithdrawalInFlight,

    /// The organizer's funds have not aged past the settlement delay.
    #[error("Funds have not matured yet")]
    FundsNotMatured,

    /// Withdrawal not found.
    #[error("Withdrawal not found: {0}")]
    NotFound(WithdrawalId),

    /// The submitted OTP does not match.
    #[error("Invalid OTP code")]
    InvalidOtp,

    /// The OTP has expired; the request is cancelled.
    #[error("OTP has expired")]
    OtpExpired,

    /// Too many wrong codes; the request is cancelled.
    #[error("Too many OTP attempts, withdrawal cancelled")]
    OtpAttemptsExceeded,

    /// The withdrawal is not in the status the operation requires.
    #[error("Invalid withdrawal state: expected {expected}, found {found}")]
    InvalidState {
        /// The status the operation requires.
        expected: &'static str,
        /// The status actually found.
        found: String,
    },

    /// The transfer port call failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WithdrawalError {
    /// Returns the error code for admin tooling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BankDetailsMissing => "BANK_DETAILS_MISSING",
            Self::BelowMinimum { .. } => "BELOW_MINIMUM",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::WithdrawalInFlight => "WITHDRAWAL_IN_FLIGHT",
            Self::FundsNotMatured => "FUNDS_NOT_MATURED",
            Self::NotFound(_) => "WITHDRAWAL_NOT_FOUND",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpAttemptsExceeded => "OTP_ATTEMPTS_EXCEEDED",
            Self::InvalidState { .. } => "INVALID_WITHDRAWAL_STATE",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the error cancelled the withdrawal outright.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::OtpAttemptsExceeded | Self::OtpExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            WithdrawalError::BankDetailsMissing.error_code(),
            "BANK_DETAILS_MISSING"
        );
        assert_eq!(
            WithdrawalError::BelowMinimum { minimum: dec!(1000) }.error_code(),
            "BELOW_MINIMUM"
        );
        assert_eq!(WithdrawalError::InvalidOtp.error_code(), "INVALID_OTP");
    }

    #[test]
    fn test_terminal_errors() {
        assert!(WithdrawalError::OtpAttemptsExceeded.is_terminal());
        assert!(WithdrawalError::OtpExpired.is_terminal());
        assert!(!WithdrawalError::InvalidOtp.is_terminal());
        assert!(!WithdrawalError::WithdrawalInFlight.is_terminal());
    }
}
