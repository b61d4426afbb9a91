//! Repository abstractions for data access.
//!
//! Each repository owns its transactions: every atomic unit described by
//! the settlement core (settle a sale, post a refund, release matured
//! funds, debit and compensate a withdrawal) begins and commits inside a
//! single repository method here.

pub mod balance;
pub mod ledger;
pub mod maturity;
pub mod payment;
pub mod refund;
pub mod settlement;
pub mod ticket;
pub mod tier;
pub mod withdrawal;

pub use balance::BalanceRepository;
pub use ledger::LedgerRepository;
pub use maturity::MaturityRepository;
pub use payment::PaymentRepository;
pub use refund::RefundRepository;
pub use settlement::SettlementRepository;
pub use ticket::TicketRepository;
pub use tier::TierRepository;
pub use withdrawal::WithdrawalRepository;
