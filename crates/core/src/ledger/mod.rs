//! Append-only financial ledger.
//!
//! This module implements the core ledger functionality:
//! - Immutable ledger entries (credits and debits)
//! - Deduplication keys for idempotent appends
//! - Balance bucket arithmetic (pending / available / withdrawn)
//! - Error types for ledger operations

pub mod balance;
pub mod entry;
pub mod error;

pub use balance::BalanceSnapshot;
pub use entry::{DedupKey, EntryType, NewLedgerEntry};
pub use error::LedgerError;
