//! Tier repository.
//!
//! Settlement reads prices from here and reserves seats with a single
//! guarded increment. Two concurrent settlements for the last seat both
//! reach the UPDATE; exactly one matches `sold < capacity`.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::tiers;

/// Tier repository.
#[derive(Debug, Clone)]
pub struct TierRepository {
    db: DatabaseConnection,
}

impl TierRepository {
    /// Creates a new tier repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a tier by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, tier_id: Uuid) -> Result<Option<tiers::Model>, DbErr> {
        tiers::Entity::find_by_id(tier_id).one(&self.db).await
    }

    /// Reserves one seat: `sold = sold + 1` guarded by `sold < capacity`.
    ///
    /// Returns true if a seat was reserved; false means the tier is sold
    /// out and the caller must roll back the settlement.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn try_reserve_seat(
        &self,
        txn: &DatabaseTransaction,
        tier_id: Uuid,
    ) -> Result<bool, DbErr> {
        let result = tiers::Entity::update_many()
            .col_expr(
                tiers::Column::Sold,
                Expr::col(tiers::Column::Sold).add(1),
            )
            .col_expr(tiers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(tiers::Column::Id.eq(tier_id))
            .filter(Expr::col(tiers::Column::Sold).lt(Expr::col(tiers::Column::Capacity)))
            .exec(txn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
