//! The check-in guard.
//!
//! One conditional UPDATE decides the winner; everyone else re-reads the
//! row and reports the state they actually found — including the winning
//! attempt's staff identity and timestamp, never their own.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::info;

use tixera_core::ticket::{CheckInOutcome, TicketStatus};
use tixera_db::TicketRepository;
use tixera_shared::types::{StaffId, TicketId};
use tixera_shared::AppError;

/// The atomic check-in guard.
#[derive(Debug, Clone)]
pub struct CheckInGuard {
    tickets: TicketRepository,
}

impl CheckInGuard {
    /// Creates a check-in guard.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tickets: TicketRepository::new(db),
        }
    }

    /// Attempts to redeem a ticket by reference.
    ///
    /// Under N concurrent attempts exactly one returns `Admitted`; all
    /// others get a consistent `AlreadyCheckedIn` answer.
    ///
    /// # Errors
    ///
    /// Returns an error only on database failures; every ticket-state
    /// condition is an outcome, not an error.
    pub async fn check_in(
        &self,
        ticket_reference: &str,
        staff_id: StaffId,
    ) -> Result<CheckInOutcome, AppError> {
        let now = Utc::now();

        let won = self
            .tickets
            .try_check_in(ticket_reference, staff_id.into_inner(), now)
            .await
            .map_err(db_err)?;

        let Some(ticket) = self
            .tickets
            .find_by_reference(ticket_reference)
            .await
            .map_err(db_err)?
        else {
            return Ok(CheckInOutcome::NotFound);
        };

        if won {
            info!(ticket = %ticket.reference, staff = %staff_id, "Ticket checked in");
            return Ok(CheckInOutcome::Admitted {
                ticket_id: TicketId::from_uuid(ticket.id),
                checked_in_at: ticket.checked_in_at.map_or(now, Into::into),
                checked_in_by: staff_id,
            });
        }

        let status: TicketStatus = ticket.status.into();
        match status {
            TicketStatus::CheckedIn => {
                // The CHECK constraint guarantees both fields are set on
                // checked-in rows.
                match (ticket.checked_in_at, ticket.checked_in_by) {
                    (Some(at), Some(by)) => Ok(CheckInOutcome::AlreadyCheckedIn {
                        ticket_id: TicketId::from_uuid(ticket.id),
                        checked_in_at: at.into(),
                        checked_in_by: StaffId::from_uuid(by),
                    }),
                    _ => Ok(CheckInOutcome::NotRedeemable {
                        ticket_id: TicketId::from_uuid(ticket.id),
                        status,
                    }),
                }
            }
            other => Ok(CheckInOutcome::NotRedeemable {
                ticket_id: TicketId::from_uuid(ticket.id),
                status: other,
            }),
        }
    }
}

fn db_err(e: sea_orm::DbErr) -> AppError {
    AppError::Database(e.to_string())
}
