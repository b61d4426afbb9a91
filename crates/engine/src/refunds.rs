//! Refund and chargeback posting.
//!
//! Compensating entries against settled sales. Duplicates are skips, the
//! same discipline as settlement: an admin retrying a refund, or a
//! provider redelivering a dispute webhook, must be harmless.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use tixera_db::repositories::refund::PostingError;
use tixera_db::RefundRepository;

/// Whether a posting changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundOutcome {
    /// The adjustment was posted.
    Posted,
    /// An identical adjustment already existed; nothing changed.
    Skipped,
}

/// Refund and chargeback posting service.
#[derive(Debug, Clone)]
pub struct RefundService {
    refunds: RefundRepository,
}

impl RefundService {
    /// Creates a refund service.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            refunds: RefundRepository::new(db),
        }
    }

    /// Posts a refund against a ticket.
    ///
    /// # Errors
    ///
    /// Returns `PostingError` when the ticket cannot be refunded or the
    /// organizer's held funds cannot cover the amount (flagged for manual
    /// review, nothing is posted).
    pub async fn post_refund(
        &self,
        ticket_reference: &str,
        amount: Decimal,
    ) -> Result<RefundOutcome, PostingError> {
        match self
            .refunds
            .post_refund(ticket_reference, amount, Utc::now())
            .await
        {
            Ok(()) => {
                info!(ticket = %ticket_reference, %amount, "Refund posted");
                Ok(RefundOutcome::Posted)
            }
            Err(PostingError::Duplicate) => {
                warn!(ticket = %ticket_reference, "Refund already posted, skipping");
                Ok(RefundOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Posts a provider chargeback against a ticket.
    ///
    /// # Errors
    ///
    /// Returns `PostingError` when the dispute cannot be applied.
    pub async fn post_chargeback(
        &self,
        ticket_reference: &str,
        amount: Decimal,
        dispute_ref: &str,
    ) -> Result<RefundOutcome, PostingError> {
        match self
            .refunds
            .post_chargeback(ticket_reference, amount, dispute_ref, Utc::now())
            .await
        {
            Ok(()) => {
                info!(ticket = %ticket_reference, %amount, %dispute_ref, "Chargeback posted");
                Ok(RefundOutcome::Posted)
            }
            Err(PostingError::Duplicate) => {
                warn!(ticket = %ticket_reference, %dispute_ref, "Chargeback already posted, skipping");
                Ok(RefundOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }
}
