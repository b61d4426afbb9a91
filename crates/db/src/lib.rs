//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Every atomic unit of the settlement core (settle, refund, release,
//! debit, compensate) is a single database transaction owned by a
//! repository method here.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    BalanceRepository, LedgerRepository, MaturityRepository, PaymentRepository, RefundRepository,
    SettlementRepository, TicketRepository, TierRepository, WithdrawalRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
