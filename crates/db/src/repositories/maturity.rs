//! The maturity release atomic unit.
//!
//! One transaction per organizer: lock the balance row, recompute the
//! releasable amount from the ledger, and move it from pending to
//! available. Each organizer is independent, so a sweep interrupted
//! between organizers loses nothing and a re-run converges to zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tixera_core::ledger::LedgerError;
use tixera_core::maturity;
use uuid::Uuid;

use super::balance::{to_snapshot, BalanceRepository};
use super::ledger::LedgerRepository;

/// Repository owning the maturity release transaction.
#[derive(Debug, Clone)]
pub struct MaturityRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
    balances: BalanceRepository,
}

impl MaturityRepository {
    /// Creates a new maturity repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            ledger: LedgerRepository::new(db.clone()),
            balances: BalanceRepository::new(db.clone()),
            db,
        }
    }

    /// Releases matured funds for one organizer.
    ///
    /// Returns the amount moved from pending to available, zero when
    /// nothing is due. The recomputation (rather than "move everything
    /// older than 24h") is what lets refunds against already-matured
    /// sales retroactively shrink the releasable amount without ever
    /// producing a negative balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Database` if any statement fails.
    pub async fn release_for_organizer(
        &self,
        organizer_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let account = self
            .balances
            .lock_or_create(&txn, organizer_id)
            .await
            .map_err(db_err)?;
        let snapshot = to_snapshot(&account);

        if snapshot.pending <= Decimal::ZERO {
            txn.commit().await.map_err(db_err)?;
            return Ok(Decimal::ZERO);
        }

        // Zero-value tickets never start the clock: an organizer with
        // only free sales keeps pending funds parked indefinitely.
        let first_paid_sale = self
            .ledger
            .first_paid_sale(&txn, organizer_id)
            .await
            .map_err(db_err)?;
        if !maturity::clock_started(first_paid_sale, now) {
            txn.commit().await.map_err(db_err)?;
            return Ok(Decimal::ZERO);
        }

        let matured = self
            .ledger
            .matured_sale_credits(&txn, organizer_id, maturity::maturity_cutoff(now))
            .await
            .map_err(db_err)?;
        let refunds = self
            .ledger
            .compensating_debits(&txn, organizer_id)
            .await
            .map_err(db_err)?;

        let amount =
            maturity::amount_to_release(matured, refunds, snapshot.released(), snapshot.pending);

        if amount > Decimal::ZERO {
            let after = snapshot.release(amount)?;
            self.balances
                .write_snapshot(&txn, organizer_id, after)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;

        Ok(amount)
    }
}

fn db_err(e: sea_orm::DbErr) -> LedgerError {
    LedgerError::Database(e.to_string())
}
