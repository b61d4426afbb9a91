//! Payment repository.
//!
//! Payments are created by the checkout flow; this repository only reads
//! them and performs the guarded terminal transitions. PENDING is the one
//! retryable state — SUCCESS and FAILED are final, and both flips are
//! conditional updates so racing settlements cannot double-apply.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, sea_query::Expr,
};

use crate::entities::{payments, sea_orm_active_enums::PaymentStatus};

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a payment by its internal reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::Reference.eq(reference))
            .one(&self.db)
            .await
    }

    /// Lists payments still awaiting confirmation, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending(&self) -> Result<Vec<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::Status.eq(PaymentStatus::Pending))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Marks a payment FAILED, only if it is still PENDING.
    ///
    /// Returns true if this call performed the transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_failed(&self, reference: &str, reason: &str) -> Result<bool, DbErr> {
        let result = payments::Entity::update_many()
            .col_expr(payments::Column::Status, PaymentStatus::Failed.as_enum())
            .col_expr(payments::Column::FailureReason, Expr::value(reason))
            .col_expr(payments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(payments::Column::Reference.eq(reference))
            .filter(payments::Column::Status.eq(PaymentStatus::Pending))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Marks a payment SUCCESS inside a settlement transaction, only if it
    /// is still PENDING.
    ///
    /// Returns true if this call won the transition; false means another
    /// worker settled the payment first and the caller must roll back.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_success(
        &self,
        txn: &DatabaseTransaction,
        reference: &str,
        external_ref: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = payments::Entity::update_many()
            .col_expr(payments::Column::Status, PaymentStatus::Success.as_enum())
            .col_expr(payments::Column::ExternalRef, Expr::value(external_ref))
            .col_expr(payments::Column::PaidAt, Expr::value(paid_at))
            .col_expr(payments::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(payments::Column::Reference.eq(reference))
            .filter(payments::Column::Status.eq(PaymentStatus::Pending))
            .exec(txn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
