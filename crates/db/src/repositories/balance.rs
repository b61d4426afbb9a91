//! Balance account repository.
//!
//! The balance row is the only hot shared resource in the system: every
//! money-moving transaction locks it with `SELECT ... FOR UPDATE` before
//! reading the buckets, so concurrent debits can never pass the
//! insufficient-funds check against a stale read.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set,
    sea_query::Expr,
};
use tixera_core::ledger::BalanceSnapshot;
use uuid::Uuid;

use crate::entities::balance_accounts;

/// Balance account repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reads an organizer's balance, zero if no account exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn snapshot(&self, organizer_id: Uuid) -> Result<BalanceSnapshot, DbErr> {
        let account = balance_accounts::Entity::find_by_id(organizer_id)
            .one(&self.db)
            .await?;

        Ok(account.map_or_else(BalanceSnapshot::zero, |model| to_snapshot(&model)))
    }

    /// Lists organizers that currently hold pending funds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn organizers_with_pending(&self) -> Result<Vec<Uuid>, DbErr> {
        balance_accounts::Entity::find()
            .filter(balance_accounts::Column::Pending.gt(Decimal::ZERO))
            .select_only()
            .column(balance_accounts::Column::OrganizerId)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
    }

    /// Locks the organizer's balance row for the duration of the
    /// transaction, creating it lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn lock_or_create(
        &self,
        txn: &DatabaseTransaction,
        organizer_id: Uuid,
    ) -> Result<balance_accounts::Model, DbErr> {
        let existing = balance_accounts::Entity::find_by_id(organizer_id)
            .lock_exclusive()
            .one(txn)
            .await?;

        if let Some(model) = existing {
            return Ok(model);
        }

        // First sale for this organizer; the inserted row is already
        // exclusive to this transaction.
        let now = Utc::now();
        let account = balance_accounts::ActiveModel {
            organizer_id: Set(organizer_id),
            pending: Set(Decimal::ZERO),
            available: Set(Decimal::ZERO),
            withdrawn: Set(Decimal::ZERO),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        account.insert(txn).await
    }

    /// Writes new bucket values for a locked balance row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn write_snapshot(
        &self,
        txn: &DatabaseTransaction,
        organizer_id: Uuid,
        snapshot: BalanceSnapshot,
    ) -> Result<(), DbErr> {
        balance_accounts::Entity::update_many()
            .col_expr(balance_accounts::Column::Pending, Expr::value(snapshot.pending))
            .col_expr(
                balance_accounts::Column::Available,
                Expr::value(snapshot.available),
            )
            .col_expr(
                balance_accounts::Column::Withdrawn,
                Expr::value(snapshot.withdrawn),
            )
            .col_expr(
                balance_accounts::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(balance_accounts::Column::OrganizerId.eq(organizer_id))
            .exec(txn)
            .await?;

        Ok(())
    }
}

/// Converts a balance row into a domain snapshot.
#[must_use]
pub fn to_snapshot(model: &balance_accounts::Model) -> BalanceSnapshot {
    BalanceSnapshot::new(model.pending, model.available, model.withdrawn)
}
