//! OTP-gated withdrawal workflow domain logic.
//!
//! A withdrawal moves matured funds out of the platform:
//! PENDING (OTP issued) → PROCESSING (OTP verified, transfer requested)
//! → COMPLETED | FAILED. The transfer call and the balance debit cannot
//! share a database transaction, so the state machine encodes the
//! compensation rules the engine must follow.

pub mod error;
pub mod otp;
pub mod state;

pub use error::WithdrawalError;
pub use otp::OtpCode;
pub use state::{BankDetails, WithdrawalPolicy, WithdrawalStatus};
