//! Refund and chargeback posting atomic units.
//!
//! A compensating debit touches three things in one transaction: the
//! ticket state, the ledger, and the balance buckets (pending drained
//! before available). A refund larger than the organizer's held funds
//! rolls back and surfaces for manual review rather than driving a
//! bucket negative.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use thiserror::Error;
use tixera_core::ledger::{LedgerError, NewLedgerEntry};
use tixera_core::ticket::TicketStatus as CoreTicketStatus;
use tixera_shared::types::{OrganizerId, TicketId};

use super::balance::{to_snapshot, BalanceRepository};
use super::ledger::LedgerRepository;
use super::ticket::TicketRepository;
use crate::entities::sea_orm_active_enums::TicketStatus;

/// Errors from refund/chargeback posting.
#[derive(Debug, Error)]
pub enum PostingError {
    /// No ticket matches the reference.
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// The ticket already carries this adjustment.
    #[error("Adjustment already posted for this ticket")]
    Duplicate,

    /// The ticket state does not admit the adjustment.
    #[error("Ticket is {status} and cannot be adjusted")]
    NotAdjustable {
        /// The ticket's current status.
        status: CoreTicketStatus,
    },

    /// The organizer's held funds cannot cover the debit.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

/// Repository owning refund and chargeback transactions.
#[derive(Debug, Clone)]
pub struct RefundRepository {
    db: DatabaseConnection,
    tickets: TicketRepository,
    ledger: LedgerRepository,
    balances: BalanceRepository,
}

impl RefundRepository {
    /// Creates a new refund repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tickets: TicketRepository::new(db.clone()),
            ledger: LedgerRepository::new(db.clone()),
            balances: BalanceRepository::new(db.clone()),
            db,
        }
    }

    /// Posts a refund: ticket active -> refunded plus a REFUND debit.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::Duplicate` when the ticket was already
    /// refunded — callers treat that as a no-op skip.
    pub async fn post_refund(
        &self,
        ticket_reference: &str,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), PostingError> {
        let txn = self.db.begin().await?;

        let ticket = self
            .tickets
            .lock_by_reference(&txn, ticket_reference)
            .await?
            .ok_or_else(|| PostingError::TicketNotFound(ticket_reference.to_string()))?;

        let status: CoreTicketStatus = ticket.status.clone().into();
        match status {
            CoreTicketStatus::Refunded => return Err(PostingError::Duplicate),
            s if !s.can_refund() => return Err(PostingError::NotAdjustable { status: s }),
            _ => {}
        }

        let organizer_id = ticket.organizer_id;
        let ticket_id = ticket.id;
        self.tickets
            .set_status(&txn, ticket, TicketStatus::Refunded)
            .await?;

        let account = self.balances.lock_or_create(&txn, organizer_id).await?;
        let after = to_snapshot(&account).apply_compensating_debit(amount)?;

        let entry = NewLedgerEntry::refund(
            OrganizerId::from_uuid(organizer_id),
            amount,
            TicketId::from_uuid(ticket_id),
            now,
        );
        match self.ledger.append(&txn, &entry, after).await {
            Ok(_) => {}
            Err(LedgerError::Duplicate(_)) => return Err(PostingError::Duplicate),
            Err(e) => return Err(PostingError::Ledger(e)),
        }

        self.balances
            .write_snapshot(&txn, organizer_id, after)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Posts a chargeback keyed by the provider's dispute reference.
    ///
    /// Active tickets are cancelled; a redeemed ticket keeps its status
    /// (the event already happened) but the money still moves.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::Duplicate` when the dispute reference was
    /// already posted.
    pub async fn post_chargeback(
        &self,
        ticket_reference: &str,
        amount: Decimal,
        dispute_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PostingError> {
        let txn = self.db.begin().await?;

        let ticket = self
            .tickets
            .lock_by_reference(&txn, ticket_reference)
            .await?
            .ok_or_else(|| PostingError::TicketNotFound(ticket_reference.to_string()))?;

        let status: CoreTicketStatus = ticket.status.clone().into();
        if matches!(
            status,
            CoreTicketStatus::Refunded | CoreTicketStatus::Cancelled
        ) {
            return Err(PostingError::Duplicate);
        }

        let organizer_id = ticket.organizer_id;
        let ticket_id = ticket.id;
        if status.can_cancel() {
            self.tickets
                .set_status(&txn, ticket, TicketStatus::Cancelled)
                .await?;
        }

        let account = self.balances.lock_or_create(&txn, organizer_id).await?;
        let after = to_snapshot(&account).apply_compensating_debit(amount)?;

        let entry = NewLedgerEntry::chargeback(
            OrganizerId::from_uuid(organizer_id),
            amount,
            TicketId::from_uuid(ticket_id),
            dispute_ref.to_string(),
            now,
        );
        match self.ledger.append(&txn, &entry, after).await {
            Ok(_) => {}
            Err(LedgerError::Duplicate(_)) => return Err(PostingError::Duplicate),
            Err(e) => return Err(PostingError::Ledger(e)),
        }

        self.balances
            .write_snapshot(&txn, organizer_id, after)
            .await?;

        txn.commit().await?;
        Ok(())
    }
}
