//! The maturity sweep.
//!
//! Periodic and on-demand: the sweeper binary runs it on an interval, and
//! the settlement engine triggers the per-organizer variant after every
//! settlement (a payment can itself make previously-pending funds due).
//! Each organizer is one idempotent atomic unit, so partial runs are
//! safe and the job can be sharded by organizer id.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use tixera_core::ledger::LedgerError;
use tixera_db::{BalanceRepository, MaturityRepository};

/// Report from a full sweep run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    /// Organizers with pending funds examined.
    pub organizers_seen: usize,
    /// Organizers that had funds released.
    pub organizers_released: usize,
    /// Total amount moved from pending to available.
    pub total_released: Decimal,
    /// Organizers whose release failed (retried next tick).
    pub errors: usize,
}

/// The maturity sweep.
#[derive(Debug, Clone)]
pub struct MaturitySweep {
    releases: MaturityRepository,
    balances: BalanceRepository,
}

impl MaturitySweep {
    /// Creates a maturity sweep.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            releases: MaturityRepository::new(db.clone()),
            balances: BalanceRepository::new(db),
        }
    }

    /// Releases matured funds for every organizer with pending funds.
    ///
    /// Per-organizer failures are logged and skipped; the next tick
    /// retries them. Interrupting the loop between organizers cannot
    /// corrupt state.
    ///
    /// # Errors
    ///
    /// Returns an error only if the organizer list cannot be read.
    pub async fn run(&self) -> Result<SweepReport, LedgerError> {
        let organizers = self
            .balances
            .organizers_with_pending()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut report = SweepReport {
            organizers_seen: organizers.len(),
            ..SweepReport::default()
        };

        for organizer_id in organizers {
            match self.run_for_organizer(organizer_id).await {
                Ok(released) if released > Decimal::ZERO => {
                    report.organizers_released += 1;
                    report.total_released += released;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%organizer_id, error = %e, "Maturity release failed");
                    report.errors += 1;
                }
            }
        }

        debug!(
            seen = report.organizers_seen,
            released = report.organizers_released,
            total = %report.total_released,
            "Maturity sweep finished"
        );

        Ok(report)
    }

    /// Releases matured funds for one organizer.
    ///
    /// Returns the amount moved from pending to available.
    ///
    /// # Errors
    ///
    /// Returns an error if the release transaction fails.
    pub async fn run_for_organizer(&self, organizer_id: Uuid) -> Result<Decimal, LedgerError> {
        let released = self
            .releases
            .release_for_organizer(organizer_id, Utc::now())
            .await?;

        if released > Decimal::ZERO {
            debug!(%organizer_id, %released, "Released matured funds");
        }

        Ok(released)
    }
}
