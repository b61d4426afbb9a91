//! Ticket redemption state machine.
//!
//! Money never flows through this module, but check-in shares the same
//! exactly-once discipline as settlement: the active → checked_in
//! transition must be a single conditional update, never read-then-write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tixera_shared::types::{StaffId, TicketId};

/// Ticket status.
///
/// The valid transitions are:
/// - Active → CheckedIn (redemption, terminal)
/// - Active → Refunded (terminal)
/// - Active → Cancelled
///
/// Nothing leaves CheckedIn or Refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued and redeemable.
    Active,
    /// Redeemed at the gate.
    CheckedIn,
    /// Refunded; no longer redeemable.
    Refunded,
    /// Cancelled by the organizer or a chargeback.
    Cancelled,
}

impl TicketStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::CheckedIn => "checked_in",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "checked_in" => Some(Self::CheckedIn),
            "refunded" => Some(Self::Refunded),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the ticket can still be redeemed.
    #[must_use]
    pub const fn is_redeemable(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the ticket can be refunded.
    #[must_use]
    pub const fn can_refund(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the ticket can be cancelled.
    #[must_use]
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of a check-in attempt.
///
/// Under N concurrent attempts for one ticket, exactly one caller sees
/// `Admitted`; all others see `AlreadyCheckedIn` carrying the identity and
/// timestamp of the attempt that won, not their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// This attempt redeemed the ticket.
    Admitted {
        /// The redeemed ticket.
        ticket_id: TicketId,
        /// When the redemption was recorded.
        checked_in_at: DateTime<Utc>,
        /// Who performed the redemption.
        checked_in_by: StaffId,
    },
    /// The ticket was already redeemed by an earlier attempt.
    AlreadyCheckedIn {
        /// The ticket in question.
        ticket_id: TicketId,
        /// When the winning attempt happened.
        checked_in_at: DateTime<Utc>,
        /// Who the winning attempt belonged to.
        checked_in_by: StaffId,
    },
    /// The ticket is refunded or cancelled.
    NotRedeemable {
        /// The ticket in question.
        ticket_id: TicketId,
        /// Its current status.
        status: TicketStatus,
    },
    /// No ticket matches the reference.
    NotFound,
}

impl CheckInOutcome {
    /// Returns true if this attempt admitted the holder.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}
