//! `SeaORM` Entity for the balance_accounts table.
//!
//! One row per organizer, created lazily on first sale. Buckets are
//! CHECK-constrained non-negative at the storage layer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "balance_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub organizer_id: Uuid,
    pub pending: Decimal,
    pub available: Decimal,
    pub withdrawn: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
