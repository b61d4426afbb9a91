//! `SeaORM` entity definitions.

pub mod balance_accounts;
pub mod ledger_entries;
pub mod payments;
pub mod sea_orm_active_enums;
pub mod tickets;
pub mod tiers;
pub mod withdrawals;
