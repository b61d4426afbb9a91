//! Ticket repository.
//!
//! Check-in is the textbook conditional-write transition: a single UPDATE
//! guarded on the current status, never read-then-write. When the UPDATE
//! matches zero rows the caller re-reads and reports the actual state.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::TicketStatus, tickets};

/// Ticket repository.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    db: DatabaseConnection,
}

impl TicketRepository {
    /// Creates a new ticket repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a ticket by its reference code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<tickets::Model>, DbErr> {
        tickets::Entity::find()
            .filter(tickets::Column::Reference.eq(reference))
            .one(&self.db)
            .await
    }

    /// Finds and locks a ticket by reference inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn lock_by_reference(
        &self,
        txn: &DatabaseTransaction,
        reference: &str,
    ) -> Result<Option<tickets::Model>, DbErr> {
        tickets::Entity::find()
            .filter(tickets::Column::Reference.eq(reference))
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Inserts a new ACTIVE ticket inside a settlement transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert_active(
        &self,
        txn: &DatabaseTransaction,
        tier_id: Uuid,
        organizer_id: Uuid,
        payment_reference: &str,
    ) -> Result<tickets::Model, DbErr> {
        let now = Utc::now();
        let id = Uuid::now_v7();
        let reference = generate_reference(id);

        let ticket = tickets::ActiveModel {
            id: Set(id),
            reference: Set(reference),
            tier_id: Set(tier_id),
            organizer_id: Set(organizer_id),
            payment_reference: Set(payment_reference.to_string()),
            status: Set(TicketStatus::Active),
            checked_in_at: Set(None),
            checked_in_by: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        ticket.insert(txn).await
    }

    /// Redeems a ticket: `active -> checked_in` as one conditional UPDATE.
    ///
    /// Returns true if this attempt won the transition. On false the
    /// caller re-reads the row for the winning attempt's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn try_check_in(
        &self,
        reference: &str,
        staff_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::Status, TicketStatus::CheckedIn.as_enum())
            .col_expr(tickets::Column::CheckedInAt, Expr::value(at))
            .col_expr(tickets::Column::CheckedInBy, Expr::value(staff_id))
            .col_expr(tickets::Column::UpdatedAt, Expr::value(at))
            .filter(tickets::Column::Reference.eq(reference))
            .filter(tickets::Column::Status.eq(TicketStatus::Active))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Moves a locked ticket to a new status inside a transaction.
    ///
    /// The caller is responsible for having checked the transition rules
    /// against the locked row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_status(
        &self,
        txn: &DatabaseTransaction,
        ticket: tickets::Model,
        status: TicketStatus,
    ) -> Result<tickets::Model, DbErr> {
        let mut active: tickets::ActiveModel = ticket.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await
    }
}

/// Builds a human-readable ticket code from the ticket ID.
fn generate_reference(id: Uuid) -> String {
    let hex = id.simple().to_string();
    format!("TIX-{}", hex[..10].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let reference = generate_reference(Uuid::now_v7());
        assert!(reference.starts_with("TIX-"));
        assert_eq!(reference.len(), 14);
    }

    #[test]
    fn test_reference_is_deterministic_per_id() {
        let id = Uuid::now_v7();
        assert_eq!(generate_reference(id), generate_reference(id));
    }
}
