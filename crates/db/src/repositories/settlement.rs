//! The settlement atomic unit.
//!
//! One transaction covers the payment flip, the seat reservation, the
//! ticket insert, the SALE ledger append, and the balance credit. If any
//! step refuses, the whole unit rolls back: an oversold tier leaves the
//! payment PENDING for manual reconciliation, and a lost idempotency race
//! leaves no trace at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use thiserror::Error;
use tixera_core::ledger::{LedgerError, NewLedgerEntry};
use tixera_shared::types::{OrganizerId, TicketId};
use uuid::Uuid;

use super::balance::{to_snapshot, BalanceRepository};
use super::ledger::LedgerRepository;
use super::payment::PaymentRepository;
use super::ticket::TicketRepository;
use super::tier::TierRepository;
use crate::entities::tickets;

/// Errors from the settlement atomic unit.
///
/// `PaymentNotPending` and `DuplicateEntry` are idempotency skips, not
/// failures: a concurrent worker already did the work.
#[derive(Debug, Error)]
pub enum SettleSaleError {
    /// Another worker flipped the payment first.
    #[error("Payment already settled or failed")]
    PaymentNotPending,

    /// The ledger store already holds an entry for this transaction.
    #[error("Ledger entry already exists for this transaction")]
    DuplicateEntry,

    /// No seats left; the transaction was rolled back.
    #[error("Tier is sold out")]
    SoldOut,

    /// Ledger validation or balance arithmetic failed.
    #[error(transparent)]
    Ledger(LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Input for settling one paid sale.
#[derive(Debug, Clone)]
pub struct SettleSaleInput {
    /// The internal payment reference.
    pub payment_reference: String,
    /// The provider's transaction identifier.
    pub external_ref: String,
    /// When the provider recorded the charge.
    pub paid_at: DateTime<Utc>,
    /// The tier being sold.
    pub tier_id: Uuid,
    /// The organizer receiving the credit.
    pub organizer_id: Uuid,
    /// The organizer's net credit; zero for free tickets.
    pub net_amount: Decimal,
}

/// A successfully settled sale.
#[derive(Debug, Clone)]
pub struct SettledSale {
    /// The newly issued ticket.
    pub ticket: tickets::Model,
}

/// Repository owning the settlement transaction.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
    payments: PaymentRepository,
    tiers: TierRepository,
    tickets: TicketRepository,
    ledger: LedgerRepository,
    balances: BalanceRepository,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            payments: PaymentRepository::new(db.clone()),
            tiers: TierRepository::new(db.clone()),
            tickets: TicketRepository::new(db.clone()),
            ledger: LedgerRepository::new(db.clone()),
            balances: BalanceRepository::new(db.clone()),
            db,
        }
    }

    /// Settles one paid sale atomically.
    ///
    /// The guarded payment flip is the first statement: whichever worker
    /// wins it owns the rest of the unit, and everyone else rolls back
    /// having changed nothing. A dropped transaction rolls back, so every
    /// early return below is a clean abort.
    ///
    /// # Errors
    ///
    /// Returns `SettleSaleError` on skips, sold-out tiers, or database
    /// failures.
    pub async fn settle_sale(&self, input: SettleSaleInput) -> Result<SettledSale, SettleSaleError> {
        let txn = self.db.begin().await?;

        let won_flip = self
            .payments
            .mark_success(
                &txn,
                &input.payment_reference,
                &input.external_ref,
                input.paid_at,
            )
            .await?;
        if !won_flip {
            return Err(SettleSaleError::PaymentNotPending);
        }

        if !self.tiers.try_reserve_seat(&txn, input.tier_id).await? {
            // Money was received but no seat exists; rolling back leaves
            // the payment PENDING so a human can reconcile it.
            return Err(SettleSaleError::SoldOut);
        }

        let ticket = self
            .tickets
            .insert_active(
                &txn,
                input.tier_id,
                input.organizer_id,
                &input.payment_reference,
            )
            .await?;

        // Free tickets settle without touching money.
        if input.net_amount > Decimal::ZERO {
            let account = self.balances.lock_or_create(&txn, input.organizer_id).await?;
            let after = to_snapshot(&account)
                .credit_pending(input.net_amount)
                .map_err(SettleSaleError::Ledger)?;

            let entry = NewLedgerEntry::sale(
                OrganizerId::from_uuid(input.organizer_id),
                input.net_amount,
                TicketId::from_uuid(ticket.id),
                input.external_ref.clone(),
                input.paid_at,
            );

            match self.ledger.append(&txn, &entry, after).await {
                Ok(_) => {}
                Err(LedgerError::Duplicate(_)) => return Err(SettleSaleError::DuplicateEntry),
                Err(e) => return Err(SettleSaleError::Ledger(e)),
            }

            self.balances
                .write_snapshot(&txn, input.organizer_id, after)
                .await?;
        }

        txn.commit().await?;

        Ok(SettledSale { ticket })
    }
}
