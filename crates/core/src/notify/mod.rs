//! Outbound notification port.
//!
//! Notifications are fire-and-forget: the engine logs delivery failures
//! and never lets them affect money or inventory state.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tixera_shared::types::{OrganizerId, TicketId, WithdrawalId};

use crate::withdrawal::WithdrawalStatus;

/// Notification delivery error.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// A ticket confirmation message for the buyer.
#[derive(Debug, Clone)]
pub struct TicketConfirmation {
    /// The newly issued ticket.
    pub ticket_id: TicketId,
    /// The ticket's human-readable reference code.
    pub ticket_reference: String,
    /// Where to send the confirmation.
    pub buyer_email: String,
}

/// A withdrawal status update for the organizer.
#[derive(Debug, Clone)]
pub struct WithdrawalUpdate {
    /// The organizer being notified.
    pub organizer_id: OrganizerId,
    /// The withdrawal in question.
    pub withdrawal_id: WithdrawalId,
    /// The withdrawal amount.
    pub amount: Decimal,
    /// The new status.
    pub status: WithdrawalStatus,
}

/// Outbound notifications, seen as an opaque port.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends the buyer their ticket confirmation.
    async fn ticket_confirmed(&self, confirmation: &TicketConfirmation) -> Result<(), NotifyError>;

    /// Sends the organizer a withdrawal OTP.
    async fn withdrawal_otp(
        &self,
        organizer_id: OrganizerId,
        withdrawal_id: WithdrawalId,
        code: &str,
    ) -> Result<(), NotifyError>;

    /// Tells the organizer their withdrawal changed status.
    async fn withdrawal_update(&self, update: &WithdrawalUpdate) -> Result<(), NotifyError>;
}
